//! Channel side effects: the standing status message and announcements.

use crate::{
    prelude::*,
    service::{
        chat::ChatClient,
        source::{Attendee, SourceEvent},
        store::{Document, StateStore},
    },
};

use super::render;

/// Upserts the standing status message for an event.
///
/// When a message ref exists the external message is edited in place; if the
/// edit fails (the message was deleted), a fresh message is posted and the
/// ref replaced. The ref change is persisted immediately so a restart does
/// not orphan the new message.
#[instrument(skip(text, state, store, chat))]
pub async fn publish_status(event_id: &str, text: &str, state: &mut Document, store: &StateStore, chat: &ChatClient) -> Void {
    if let Some(message_id) = state.channel_messages.get(event_id).cloned() {
        match chat.update_message(&message_id, text).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                warn!("Could not find previous message for event `{event_id}`, sending a new one: {err:#}");
            }
        }
    }

    let message_id = chat.post_message(text).await?;
    state.channel_messages.insert(event_id.to_string(), message_id);

    if let Err(err) = store.save(state).await {
        error!("Failed to persist status message ref for event `{event_id}`: {err:#}");
    }

    Ok(())
}

/// Posts the one-time rich announcement for a newly discovered event.
#[instrument(skip_all, fields(event_id = %event.id))]
pub async fn announce_new_event(chat: &ChatClient, event: &SourceEvent) -> Void {
    chat.post_message(&render::new_event_body(event)).await?;

    Ok(())
}

/// Posts the one-line announcement for a single new RSVP.
#[instrument(skip_all, fields(attendee_id = %attendee.id))]
pub async fn announce_addition(chat: &ChatClient, event_name: &str, attendee: &Attendee) -> Void {
    chat.post_message(&render::addition_line(event_name, attendee)).await?;

    Ok(())
}
