//! Library root for `rsvp-bot`.
//!
//! Rsvp-bot watches Meetup groups for upcoming events and mirrors attendance
//! into a Slack channel:
//! - Announces newly published events
//! - Keeps one standing status message per event current with the attendee list
//! - Calls out each new RSVP as it arrives
//! - Drops events a day after they end
//!
//! The bot integrates with Slack for chat and the Meetup API for event data,
//! persisting its tracking state as a single JSON document. The architecture
//! is built around extensible traits that allow for different implementations
//! of each service.

#[deny(missing_docs)]
pub mod base;
pub mod prelude;
pub mod runtime;
pub mod service;
pub mod tracker;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the rsvp-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with state store, source, and chat clients
/// - Starts the scheduler, health endpoint, and chat listener
pub async fn start(config: Config) -> Void {
    info!("Starting rsvp-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().unwrap();

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
