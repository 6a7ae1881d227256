pub mod json;

use std::{
    collections::BTreeMap,
    ops::Deref,
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    base::types::{Res, Void},
    service::source::SourceEvent,
};

// Traits.

/// Generic state store trait that backends must implement.
///
/// This trait defines the load/save cycle for the single persisted document
/// holding the watch list, tracked events, and standing message refs.
/// Implementing this trait allows different storage backends to be used
/// with the rsvp-bot.
#[async_trait]
pub trait GenericStateStore: Send + Sync + 'static {
    /// Load the persisted document.
    ///
    /// A missing document is not an error: the default empty document is
    /// returned so a fresh deployment starts with nothing watched.
    async fn load(&self) -> Res<Document>;

    /// Durably persist the full document.
    ///
    /// The write must never leave a partially-written document behind.
    async fn save(&self, document: &Document) -> Void;
}

// Structs.

/// State store for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<dyn GenericStateStore>,
}

impl Deref for StateStore {
    type Target = dyn GenericStateStore;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl StateStore {
    pub fn new(inner: Arc<dyn GenericStateStore>) -> Self {
        Self { inner }
    }
}

// Data types.

/// The single persisted document.
///
/// Everything the bot needs to survive a restart lives here: which groups are
/// watched, which events are tracked (with their last observed RSVP sets),
/// and which channel message holds each event's status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Watched group URL names. Set semantics; order is insertion order.
    #[serde(default)]
    pub watched_groups: Vec<String>,
    /// Tracked events, keyed by event id.
    #[serde(default)]
    pub tracked_events: BTreeMap<String, TrackedEvent>,
    /// Standing status message ids, keyed by event id.
    #[serde(default)]
    pub channel_messages: BTreeMap<String, String>,
}

impl Document {
    /// Removes a group from the watch list, cascading deletion of its tracked
    /// events and their standing message refs. Returns `false` when the group
    /// was not watched.
    pub fn remove_group(&mut self, url_name: &str) -> bool {
        let Some(position) = self.watched_groups.iter().position(|g| g == url_name) else {
            return false;
        };

        self.watched_groups.remove(position);

        let doomed: Vec<String> = self
            .tracked_events
            .iter()
            .filter(|(_, event)| event.group_url_name == url_name)
            .map(|(id, _)| id.clone())
            .collect();

        for event_id in doomed {
            self.tracked_events.remove(&event_id);
            self.channel_messages.remove(&event_id);
        }

        true
    }
}

/// A tracked event and its last observed RSVP set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEvent {
    /// URL name of the owning group.
    pub group_url_name: String,
    /// Event display name.
    pub event_name: String,
    /// Local event date (`YYYY-MM-DD`).
    pub event_date: String,
    /// Local event time (`HH:MM`), when announced.
    pub event_time: Option<String>,
    /// Venue name, `"TBA"` when the source has none.
    pub venue: String,
    /// Canonical event link.
    pub link: String,
    /// Last observed "yes" RSVPs, keyed by attendee id.
    pub rsvps: BTreeMap<String, RsvpRecord>,
}

impl TrackedEvent {
    /// Creates a fresh tracking record for a newly discovered event.
    pub fn from_source(group_url_name: &str, event: &SourceEvent) -> Self {
        Self {
            group_url_name: group_url_name.to_string(),
            event_name: event.name.clone(),
            event_date: event.local_date.clone(),
            event_time: event.local_time.clone(),
            venue: event.venue.as_ref().map(|v| v.name.clone()).unwrap_or_else(|| "TBA".to_string()),
            link: event.link.clone(),
            rsvps: BTreeMap::new(),
        }
    }

    /// Refreshes the detail fields from an authoritative fetch. Date, time,
    /// and venue can all change after an event is published.
    pub fn refresh_from(&mut self, event: &SourceEvent) {
        self.event_name = event.name.clone();
        self.event_date = event.local_date.clone();
        self.event_time = event.local_time.clone();
        self.venue = event.venue.as_ref().map(|v| v.name.clone()).unwrap_or_else(|| "TBA".to_string());
        self.link = event.link.clone();
    }
}

/// A stored attendee response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsvpRecord {
    /// Attendee display name.
    pub name: String,
    /// Response kind as reported by the source (e.g. `"yes"`).
    pub response: String,
    /// When the source last saw this response change.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
}

// Tests.
