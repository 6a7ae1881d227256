//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for various services used by the rsvp-bot:
//! - Chat services (e.g., Slack)
//! - Event source services (e.g., the Meetup API)
//! - State storage (e.g., a JSON document on disk)
//! - The liveness endpoint
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod health;
pub mod source;
pub mod store;
