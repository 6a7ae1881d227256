pub mod meetup;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::base::types::Res;

// Traits.

/// Generic event source trait that clients must implement.
///
/// This trait defines the read-only view of the remote group/event/RSVP data
/// source. Implementing this trait allows different event platforms to be
/// used with the rsvp-bot.
///
/// List operations degrade to empty results on failure so one broken group or
/// event never aborts a whole cycle; lookups that feed user-facing replies or
/// gate further processing surface their errors instead.
#[async_trait]
pub trait GenericSourceClient: Send + Sync + 'static {
    /// Get details for a single group.
    async fn get_group(&self, url_name: &str) -> Res<GroupInfo>;

    /// List upcoming events for a group. Empty on failure.
    async fn list_upcoming_events(&self, url_name: &str) -> Vec<SourceEvent>;

    /// Get the authoritative detail for a single event.
    async fn get_event_detail(&self, url_name: &str, event_id: &str) -> Res<SourceEvent>;

    /// List current "yes" responses for an event. Empty on failure.
    async fn list_yes_rsvps(&self, url_name: &str, event_id: &str) -> Vec<Attendee>;
}

// Structs.

/// Event source client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct SourceClient {
    inner: Arc<dyn GenericSourceClient>,
}

impl Deref for SourceClient {
    type Target = dyn GenericSourceClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl SourceClient {
    pub fn new(inner: Arc<dyn GenericSourceClient>) -> Self {
        Self { inner }
    }
}

// Data types.

/// Group details as reported by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub name: String,
    pub urlname: String,
    #[serde(default)]
    pub members: u64,
    #[serde(default)]
    pub link: String,
}

/// An event as reported by the source, used both for upcoming-event listings
/// and for single-event detail fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvent {
    pub id: String,
    pub name: String,
    /// Local event date (`YYYY-MM-DD`).
    pub local_date: String,
    /// Local event time (`HH:MM`), when announced.
    #[serde(default)]
    pub local_time: Option<String>,
    #[serde(default)]
    pub venue: Option<Venue>,
    #[serde(default)]
    pub link: String,
}

/// An event venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
}

/// A "yes" response for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    /// Source-wide attendee identity.
    pub id: String,
    /// Attendee display name.
    pub name: String,
    /// Response kind (e.g. `"yes"`).
    pub response: String,
    /// When the source last saw this response change.
    pub updated: DateTime<Utc>,
}
