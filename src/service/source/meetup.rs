//! Meetup API implementation of the event source.
//!
//! All requests authenticate with the API key as a query parameter. Upcoming
//! event listings are bounded by the configured page size, and RSVP fetches
//! ask the API for "yes" responses only.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::base::{
    config::Config,
    types::Res,
};

use super::{Attendee, GenericSourceClient, GroupInfo, SourceClient, SourceEvent};

// Extra methods on `SourceClient` applied by the Meetup implementation.

impl SourceClient {
    /// Creates a new Meetup source client.
    pub fn meetup(config: &Config) -> Res<Self> {
        let client = MeetupSourceClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// Meetup API client.
pub struct MeetupSourceClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    page_size: u32,
}

impl MeetupSourceClient {
    pub fn new(config: &Config) -> Res<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http,
            api_base: config.meetup_api_base.trim_end_matches('/').to_string(),
            api_key: config.meetup_api_key.clone(),
            page_size: config.upcoming_page_size,
        })
    }

    /// Fills in a canonical link for events the API returned without one.
    fn with_link_fallback(&self, url_name: &str, mut event: SourceEvent) -> SourceEvent {
        if event.link.is_empty() {
            event.link = format!("https://meetup.com/{url_name}/events/{}", event.id);
        }

        event
    }
}

#[async_trait]
impl GenericSourceClient for MeetupSourceClient {
    #[instrument(skip(self))]
    async fn get_group(&self, url_name: &str) -> Res<GroupInfo> {
        let url = format!("{}/{url_name}", self.api_base);

        let group = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<GroupInfo>()
            .await
            .with_context(|| format!("Failed to fetch group `{url_name}`"))?;

        Ok(group)
    }

    #[instrument(skip(self))]
    async fn list_upcoming_events(&self, url_name: &str) -> Vec<SourceEvent> {
        let url = format!("{}/{url_name}/events", self.api_base);
        let page = self.page_size.to_string();

        let result = async {
            let events = self
                .http
                .get(&url)
                .query(&[("key", self.api_key.as_str()), ("status", "upcoming"), ("page", page.as_str())])
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<SourceEvent>>()
                .await?;

            Ok::<_, anyhow::Error>(events)
        }
        .await;

        match result {
            Ok(events) => events.into_iter().map(|e| self.with_link_fallback(url_name, e)).collect(),
            Err(err) => {
                warn!("Failed to fetch upcoming events for group `{url_name}`: {err:#}");
                Vec::new()
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_event_detail(&self, url_name: &str, event_id: &str) -> Res<SourceEvent> {
        let url = format!("{}/{url_name}/events/{event_id}", self.api_base);

        let event = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<SourceEvent>()
            .await
            .with_context(|| format!("Failed to fetch detail for event `{event_id}`"))?;

        Ok(self.with_link_fallback(url_name, event))
    }

    #[instrument(skip(self))]
    async fn list_yes_rsvps(&self, url_name: &str, event_id: &str) -> Vec<Attendee> {
        let url = format!("{}/{url_name}/events/{event_id}/rsvps", self.api_base);

        let result = async {
            let rsvps = self
                .http
                .get(&url)
                .query(&[("key", self.api_key.as_str()), ("response", "yes")])
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<RsvpWire>>()
                .await?;

            Ok::<_, anyhow::Error>(rsvps)
        }
        .await;

        match result {
            Ok(rsvps) => rsvps.into_iter().map(Attendee::from).collect(),
            Err(err) => {
                warn!("Failed to fetch RSVPs for event `{event_id}`: {err:#}");
                Vec::new()
            }
        }
    }
}

// Wire types.

/// An RSVP as the Meetup API reports it.
#[derive(Debug, Deserialize)]
struct RsvpWire {
    response: String,
    /// Epoch millis of the last response change.
    #[serde(default)]
    updated: i64,
    member: MemberWire,
}

/// The member half of an RSVP record.
#[derive(Debug, Deserialize)]
struct MemberWire {
    id: u64,
    name: String,
}

impl From<RsvpWire> for Attendee {
    fn from(wire: RsvpWire) -> Self {
        Self {
            id: wire.member.id.to_string(),
            name: wire.member.name,
            response: wire.response,
            updated: DateTime::from_timestamp_millis(wire.updated).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsvp_wire_maps_numeric_member_ids() {
        let wire: RsvpWire = serde_json::from_value(serde_json::json!({
            "response": "yes",
            "updated": 1_750_000_000_000i64,
            "member": { "id": 101, "name": "Ada" }
        }))
        .unwrap();

        let attendee = Attendee::from(wire);

        assert_eq!(attendee.id, "101");
        assert_eq!(attendee.name, "Ada");
        assert_eq!(attendee.updated.timestamp_millis(), 1_750_000_000_000);
    }

    #[test]
    fn event_without_link_gets_canonical_fallback() {
        let config = Config {
            inner: std::sync::Arc::new(crate::base::config::ConfigInner {
                meetup_api_base: "https://api.meetup.com".to_string(),
                upcoming_page_size: 10,
                ..Default::default()
            }),
        };
        let client = MeetupSourceClient::new(&config).unwrap();

        let event = SourceEvent {
            id: "e1".to_string(),
            name: "Hack Night".to_string(),
            local_date: "2026-08-20".to_string(),
            local_time: None,
            venue: None,
            link: String::new(),
        };

        let event = client.with_link_fallback("rust-enthusiasts", event);

        assert_eq!(event.link, "https://meetup.com/rust-enthusiasts/events/e1");
    }
}
