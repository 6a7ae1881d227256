//! Event tracking and RSVP reconciliation.
//!
//! This module is the heart of the bot. The [`Tracker`] owns the persisted
//! document behind a single mutex, so scheduled cycles and operator commands
//! all mutate state on one serialized timeline:
//! - Discovery registers newly published events and announces them.
//! - Reconciliation diffs each event's attendee set against the last
//!   observation and pushes the changes into the channel.
//! - Commands maintain the watch list.

pub mod command;
pub mod discovery;
pub mod notify;
pub mod reconcile;
pub mod render;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::{Local, Utc};
use futures::future::join_all;
use tokio::sync::Mutex;

use crate::{
    prelude::*,
    service::{chat::ChatClient, source::SourceClient, store::{Document, StateStore}},
};

use self::{command::Command, reconcile::Outcome};

/// Tracking engine shared by the scheduler and the command surface.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without an outer `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Tracker {
    store: StateStore,
    source: SourceClient,
    state: Arc<Mutex<Document>>,
    warmed_up: Arc<AtomicBool>,
}

impl Tracker {
    /// Creates a tracker over a previously loaded document.
    ///
    /// The warm-up flag always starts unset, even across restarts, so RSVPs
    /// that accumulated while the process was down are absorbed silently.
    pub fn new(store: StateStore, source: SourceClient, initial: Document) -> Self {
        Self {
            store,
            source,
            state: Arc::new(Mutex::new(initial)),
            warmed_up: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the startup grace period has passed.
    pub fn is_warmed_up(&self) -> bool {
        self.warmed_up.load(Ordering::SeqCst)
    }

    /// Ends the startup grace period; RSVP additions announce from here on.
    pub fn complete_warm_up(&self) {
        self.warmed_up.store(true, Ordering::SeqCst);
        info!("Initial setup complete, now tracking RSVP changes.");
    }

    /// Returns a copy of the current document. Primarily for inspection.
    pub async fn snapshot(&self) -> Document {
        self.state.lock().await.clone()
    }

    /// Runs one discovery pass: registers unseen events across the watched
    /// groups, announces each, and seeds its standing status message.
    #[instrument(skip_all)]
    pub async fn discover(&self, chat: &ChatClient) -> Void {
        let mut state = self.state.lock().await;

        if state.watched_groups.is_empty() {
            debug!("No groups being watched yet.");
            return Ok(());
        }

        let new_events = discovery::discover_new_events(&mut state, &self.source, &self.store).await;

        for event in new_events {
            if let Err(err) = notify::announce_new_event(chat, &event).await {
                error!("Error announcing new event `{}`: {err:#}", event.id);
            }

            let body = render::status_body(&event, &[], Utc::now());
            if let Err(err) = notify::publish_status(&event.id, &body, &mut state, &self.store, chat).await {
                error!("Error publishing status for new event `{}`: {err:#}", event.id);
            }
        }

        Ok(())
    }

    /// Runs one reconcile pass over every tracked event.
    ///
    /// Each event is an isolated unit of work: its outcome is persisted and
    /// published before the next event is touched, and its errors are logged
    /// without disturbing the rest of the pass.
    #[instrument(skip_all)]
    pub async fn reconcile_all(&self, chat: &ChatClient) -> Void {
        let mut state = self.state.lock().await;

        let event_ids: Vec<String> = state.tracked_events.keys().cloned().collect();
        if event_ids.is_empty() {
            return Ok(());
        }

        let now = Local::now().naive_local();

        for event_id in event_ids {
            match reconcile::reconcile_event(&event_id, &mut state, &self.source, self.is_warmed_up(), now).await {
                Ok(Outcome::Updated { event, diff }) => {
                    self.persist(&state).await;

                    let body = render::status_body(&event, &diff.current, Utc::now());
                    if let Err(err) = notify::publish_status(&event_id, &body, &mut state, &self.store, chat).await {
                        error!("Error publishing status for event `{event_id}`: {err:#}");
                    }

                    for attendee in &diff.added {
                        if let Err(err) = notify::announce_addition(chat, &event.name, attendee).await {
                            error!("Error announcing RSVP for event `{event_id}`: {err:#}");
                        }
                    }
                }
                Ok(Outcome::Expired) => {
                    self.persist(&state).await;
                }
                Ok(Outcome::Skipped) => {}
                Err(err) => {
                    error!("Error updating RSVPs for event `{event_id}`: {err:#}");
                }
            }
        }

        Ok(())
    }

    /// Dispatches one operator command, returning the user-facing reply.
    #[instrument(skip(self, chat))]
    pub async fn handle_command(&self, command: Command, chat: &ChatClient) -> Res<String> {
        match command {
            Command::WatchGroup { url_name } => self.watch_group(url_name, chat).await,
            Command::UnwatchGroup { url_name } => self.unwatch_group(url_name).await,
            Command::ListGroups => self.list_groups().await,
            Command::Refresh => Ok(self.refresh(chat)),
        }
    }

    async fn watch_group(&self, url_name: String, chat: &ChatClient) -> Res<String> {
        // Validate against the source before touching state so a typo never
        // enters the watch list.
        let group = match self.source.get_group(&url_name).await {
            Ok(group) => group,
            Err(err) => {
                warn!("Error validating group `{url_name}`: {err:#}");
                return Ok(format!(
                    "Error: Could not find or access the group \"{url_name}\". Please check the URL name and your API permissions."
                ));
            }
        };

        {
            let mut state = self.state.lock().await;

            if state.watched_groups.iter().any(|g| g == &url_name) {
                return Ok(format!("Already watching {}. Use /refresh to update now.", group.name));
            }

            state.watched_groups.push(url_name.clone());
            self.persist(&state).await;
        }

        // Pick up the group's events without waiting for the next scheduled
        // discovery pass.
        let tracker = self.clone();
        let chat = chat.clone();
        tokio::spawn(async move {
            if let Err(err) = tracker.discover(&chat).await {
                error!("Error finding upcoming events: {err:#}");
            }
        });

        Ok(format!("Now watching group: {} ({url_name}). I'll start tracking upcoming events automatically.", group.name))
    }

    async fn unwatch_group(&self, url_name: String) -> Res<String> {
        let mut state = self.state.lock().await;

        if !state.remove_group(&url_name) {
            return Ok(format!("Not watching any group named \"{url_name}\"."));
        }

        self.persist(&state).await;

        Ok(format!("Stopped watching group \"{url_name}\" and removed any tracked events from this group."))
    }

    async fn list_groups(&self) -> Res<String> {
        let state = self.state.lock().await;

        if state.watched_groups.is_empty() {
            return Ok("Not watching any groups yet. Use /watchgroup to add a group.".to_string());
        }

        let fetched = join_all(state.watched_groups.iter().map(|group| self.source.get_group(group))).await;

        let mut reply = String::from("**Watched Groups:**\n\n");

        for (url_name, result) in state.watched_groups.iter().zip(fetched) {
            match result {
                Ok(group) => {
                    reply.push_str(&format!("- **{}** ({})\n  {} members · {}\n\n", group.name, group.urlname, group.members, group.link));
                }
                Err(err) => {
                    warn!("Error fetching group details for `{url_name}`: {err:#}");
                    reply.push_str(&format!("- {url_name} (details unavailable)\n\n"));
                }
            }
        }

        reply.push_str(&format!("\nCurrently tracking {} upcoming events from these groups.", state.tracked_events.len()));

        Ok(reply)
    }

    /// Acknowledges immediately; the refresh itself serializes behind the
    /// state mutex with any in-flight scheduled cycle.
    fn refresh(&self, chat: &ChatClient) -> String {
        let tracker = self.clone();
        let chat = chat.clone();

        tokio::spawn(async move {
            if let Err(err) = tracker.discover(&chat).await {
                error!("Error finding upcoming events: {err:#}");
            }
            if let Err(err) = tracker.reconcile_all(&chat).await {
                error!("Error updating tracked events: {err:#}");
            }
        });

        "Manually refreshing all groups and events...".to_string()
    }

    /// Persists the document, keeping the in-memory copy authoritative when
    /// the write fails.
    async fn persist(&self, document: &Document) {
        if let Err(err) = self.store.save(document).await {
            error!("Error saving tracker state: {err:#}");
        }
    }
}
