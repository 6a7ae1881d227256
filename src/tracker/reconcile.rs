//! Per-event RSVP reconciliation.
//!
//! Each cycle refreshes the authoritative event detail, applies the expiry
//! rule, and diffs the fetched "yes" responses against the stored set. The
//! fetched set always wins: newcomers are additions, absentees are dropped
//! without history.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::{
    prelude::*,
    service::{
        source::{Attendee, SourceClient, SourceEvent},
        store::{Document, RsvpRecord},
    },
};

/// The classified result of one reconcile cycle for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RsvpDiff {
    /// Attendees present now but absent last cycle. Empty during warm-up even
    /// when state changed.
    pub added: Vec<Attendee>,
    /// Attendee ids present last cycle but absent now.
    pub removed: Vec<String>,
    /// All currently-present attendees, deduplicated by id.
    pub current: Vec<Attendee>,
}

/// What happened to an event during a reconcile cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The event is still live; state was refreshed and diffed.
    Updated { event: SourceEvent, diff: RsvpDiff },
    /// The event ended more than a day ago and was untracked.
    Expired,
    /// The authoritative detail could not be fetched; nothing changed.
    Skipped,
}

/// Merges the fetched attendee set into the stored one and classifies the
/// difference.
///
/// The stored set is rebuilt from the fetch: records for present ids are
/// overwritten, absent ids are discarded. While `warmed_up` is false the
/// merge still happens but the returned `added` list stays empty so
/// pre-existing responses are not replayed as news.
pub fn apply_rsvps(stored: &mut BTreeMap<String, RsvpRecord>, fetched: &[Attendee], warmed_up: bool) -> RsvpDiff {
    // The source does not guarantee ordering or uniqueness; collapse by id,
    // last entry wins.
    let mut present: BTreeMap<String, Attendee> = BTreeMap::new();

    for attendee in fetched {
        present.insert(attendee.id.clone(), attendee.clone());
    }

    let mut added = Vec::new();

    if warmed_up {
        for (id, attendee) in &present {
            if !stored.contains_key(id) {
                added.push(attendee.clone());
            }
        }
    }

    let removed: Vec<String> = stored.keys().filter(|id| !present.contains_key(*id)).cloned().collect();

    *stored = present
        .iter()
        .map(|(id, attendee)| {
            (
                id.clone(),
                RsvpRecord {
                    name: attendee.name.clone(),
                    response: attendee.response.clone(),
                    time: attendee.updated,
                },
            )
        })
        .collect();

    RsvpDiff {
        added,
        removed,
        current: present.into_values().collect(),
    }
}

/// Parses an event's local start from its date and optional time. Missing
/// times count as midnight.
fn event_start(date: &str, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = time
        .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap());

    Some(date.and_time(time))
}

/// An event is expired once it started more than a day ago. Events whose
/// start cannot be parsed never expire here; they stay tracked rather than
/// silently vanishing.
pub fn is_expired(date: &str, time: Option<&str>, now: NaiveDateTime) -> bool {
    match event_start(date, time) {
        Some(start) => now - start > TimeDelta::hours(24),
        None => false,
    }
}

/// Runs one reconcile cycle for one tracked event.
///
/// The caller owns persistence: every non-`Skipped` outcome mutated the
/// document and must be saved before side effects go out.
#[instrument(skip(state, source))]
pub async fn reconcile_event(event_id: &str, state: &mut Document, source: &SourceClient, warmed_up: bool, now: NaiveDateTime) -> Res<Outcome> {
    let Some(tracked) = state.tracked_events.get(event_id) else {
        return Err(anyhow!("No tracked event with id `{event_id}`."));
    };
    let group = tracked.group_url_name.clone();

    // Refresh the authoritative detail; date, time, and venue can all change
    // after an event is published. A failed fetch skips the cycle rather than
    // publishing stale or placeholder text.
    let event = match source.get_event_detail(&group, event_id).await {
        Ok(event) => event,
        Err(err) => {
            warn!("Could not refresh event `{event_id}`, retrying next cycle: {err:#}");
            return Ok(Outcome::Skipped);
        }
    };

    if is_expired(&event.local_date, event.local_time.as_deref(), now) {
        info!("Event {} ({event_id}) has passed. Removing from tracking.", event.name);

        state.tracked_events.remove(event_id);
        state.channel_messages.remove(event_id);

        return Ok(Outcome::Expired);
    }

    let fetched = source.list_yes_rsvps(&group, event_id).await;

    let Some(tracked) = state.tracked_events.get_mut(event_id) else {
        return Err(anyhow!("No tracked event with id `{event_id}`."));
    };

    tracked.refresh_from(&event);
    let diff = apply_rsvps(&mut tracked.rsvps, &fetched, warmed_up);

    Ok(Outcome::Updated { event, diff })
}

// Tests.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn attendee(id: &str, name: &str) -> Attendee {
        Attendee {
            id: id.to_string(),
            name: name.to_string(),
            response: "yes".to_string(),
            updated: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn stored_from(attendees: &[Attendee]) -> BTreeMap<String, RsvpRecord> {
        let mut stored = BTreeMap::new();
        apply_rsvps(&mut stored, attendees, false);
        stored
    }

    #[test]
    fn diff_classifies_additions_and_removals() {
        let mut stored = stored_from(&[attendee("1", "Ada"), attendee("2", "Brian")]);

        let fetched = [attendee("2", "Brian"), attendee("3", "Carol")];
        let diff = apply_rsvps(&mut stored, &fetched, true);

        assert_eq!(diff.added.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), vec!["3"]);
        assert_eq!(diff.removed, vec!["1".to_string()]);
        assert_eq!(stored.keys().collect::<Vec<_>>(), vec!["2", "3"]);
    }

    #[test]
    fn diff_collapses_duplicate_attendee_ids() {
        let mut stored = BTreeMap::new();

        let mut renamed = attendee("1", "Ada");
        renamed.name = "Ada L.".to_string();

        let diff = apply_rsvps(&mut stored, &[attendee("1", "Ada"), renamed], true);

        assert_eq!(diff.current.len(), 1);
        assert_eq!(diff.added.len(), 1);
        // Last fetched entry wins.
        assert_eq!(stored["1"].name, "Ada L.");
    }

    #[test]
    fn warm_up_merges_without_reporting_additions() {
        let mut stored = BTreeMap::new();

        let fetched = [attendee("1", "Ada"), attendee("2", "Brian"), attendee("3", "Carol")];
        let diff = apply_rsvps(&mut stored, &fetched, false);

        assert!(diff.added.is_empty());
        assert_eq!(stored.len(), 3);
        assert_eq!(diff.current.len(), 3);
    }

    #[test]
    fn empty_fetch_removes_everyone() {
        let mut stored = stored_from(&[attendee("1", "Ada")]);

        let diff = apply_rsvps(&mut stored, &[], true);

        assert!(diff.added.is_empty());
        assert_eq!(diff.removed, vec!["1".to_string()]);
        assert!(stored.is_empty());
    }

    #[test]
    fn identical_fetch_yields_empty_diff() {
        let attendees = [attendee("1", "Ada"), attendee("2", "Brian")];
        let mut stored = stored_from(&attendees);

        let diff = apply_rsvps(&mut stored, &attendees, true);

        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn expiry_is_a_day_after_start() {
        let now = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap().and_time(NaiveTime::from_hms_opt(20, 0, 0).unwrap());

        // 25 hours past.
        assert!(is_expired("2026-08-01", Some("19:00"), now));
        // 23 hours past.
        assert!(!is_expired("2026-08-01", Some("21:00"), now));
        // Still upcoming.
        assert!(!is_expired("2026-08-03", Some("19:00"), now));
    }

    #[test]
    fn missing_time_expires_from_midnight() {
        let now = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap().and_time(NaiveTime::from_hms_opt(1, 0, 0).unwrap());

        assert!(is_expired("2026-08-01", None, now));
        assert!(!is_expired("2026-08-02", None, now));
    }

    #[test]
    fn unparseable_dates_never_expire() {
        let now = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap().and_time(NaiveTime::from_hms_opt(1, 0, 0).unwrap());

        assert!(!is_expired("someday", Some("19:00"), now));
        assert!(!is_expired("", None, now));
    }
}
