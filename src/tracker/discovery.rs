//! New-event discovery across the watched groups.

use crate::{
    prelude::*,
    service::{
        source::{SourceClient, SourceEvent},
        store::{Document, StateStore, TrackedEvent},
    },
};

/// Registers any upcoming events the watched groups have published since the
/// last pass, returning them in discovery order for announcement.
///
/// State is persisted after each registration so a crash partway through the
/// group list keeps the earlier registrations durable. A group whose fetch
/// fails yields no events and does not disturb the remaining groups.
#[instrument(skip_all)]
pub async fn discover_new_events(state: &mut Document, source: &SourceClient, store: &StateStore) -> Vec<SourceEvent> {
    let mut discovered = Vec::new();

    for group in state.watched_groups.clone() {
        let events = source.list_upcoming_events(&group).await;

        for event in events {
            if state.tracked_events.contains_key(&event.id) {
                continue;
            }

            info!("Found new event: {} ({}) in group {group}.", event.name, event.id);

            state.tracked_events.insert(event.id.clone(), TrackedEvent::from_source(&group, &event));

            if let Err(err) = store.save(state).await {
                error!("Failed to persist newly tracked event `{}`: {err:#}", event.id);
            }

            discovered.push(event);
        }
    }

    discovered
}
