//! Message rendering.
//!
//! Pure text builders for the standing status message, the new-event
//! announcement, and the per-attendee RSVP line. Everything here is
//! deterministic so a status body can be rebuilt and compared at any time.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::service::source::{Attendee, SourceEvent};

/// Formats an event date as long-form prose ("Thursday, August 20, 2026").
/// Unparseable dates pass through as-is rather than rendering as garbage.
fn long_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%A, %B %-d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

/// Formats an event time as a 12-hour clock ("07:00 PM"), or "TBA" when the
/// event has no announced time.
fn clock_time(time: Option<&str>) -> String {
    time.and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
        .map(|parsed| parsed.format("%I:%M %p").to_string())
        .unwrap_or_else(|| "TBA".to_string())
}

fn venue_name(event: &SourceEvent) -> String {
    event.venue.as_ref().map(|v| v.name.clone()).unwrap_or_else(|| "TBA".to_string())
}

/// Sorts attendees for rendering: display name, case-insensitive, ascending,
/// ties broken by attendee id. Fetch order never leaks into the output.
pub fn sorted_attendees(attendees: &[Attendee]) -> Vec<Attendee> {
    let mut sorted = attendees.to_vec();
    sorted.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.id.cmp(&b.id)));
    sorted
}

/// Builds the canonical status message body for an event.
///
/// Identical inputs (including `now`) produce identical text.
pub fn status_body(event: &SourceEvent, attendees: &[Attendee], now: DateTime<Utc>) -> String {
    let mut message = format!("# 📅 {}\n\n", event.name);

    message.push_str(&format!("**Date:** {}\n", long_date(&event.local_date)));
    message.push_str(&format!("**Time:** {}\n", clock_time(event.local_time.as_deref())));
    message.push_str(&format!("**Location:** {}\n\n", venue_name(event)));
    message.push_str(&format!("**Event Link:** {}\n\n", event.link));

    message.push_str(&format!("## Attendees ({})\n\n", attendees.len()));

    if attendees.is_empty() {
        message.push_str("No one has RSVP'd yet. Be the first!");
    } else {
        for attendee in sorted_attendees(attendees) {
            message.push_str(&format!("- {}\n", attendee.name));
        }
    }

    message.push_str(&format!("\n_Last updated: {}_", now.format("%Y-%m-%d %H:%M:%S UTC")));

    message
}

/// Builds the one-time announcement for a newly discovered event.
pub fn new_event_body(event: &SourceEvent) -> String {
    let mut message = format!("# 🆕 New Meetup Event: {}\n\n", event.name);

    message.push_str(&format!("**Date:** {}\n", long_date(&event.local_date)));
    message.push_str(&format!("**Time:** {}\n", clock_time(event.local_time.as_deref())));
    message.push_str(&format!("**Location:** {}\n\n", venue_name(event)));
    message.push_str(&format!("**Event Link:** {}\n\n", event.link));
    message.push_str("Use the link above to RSVP! I'll keep track of who's attending and post updates here.");

    message
}

/// Builds the one-line announcement for a single new RSVP.
pub fn addition_line(event_name: &str, attendee: &Attendee) -> String {
    format!("🎉 **{}** just RSVP'd {} to **{event_name}**!", attendee.name, attendee.response)
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::source::Venue;

    fn attendee(id: &str, name: &str) -> Attendee {
        Attendee {
            id: id.to_string(),
            name: name.to_string(),
            response: "yes".to_string(),
            updated: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn event() -> SourceEvent {
        SourceEvent {
            id: "e1".to_string(),
            name: "Monthly Hack Night".to_string(),
            local_date: "2026-08-20".to_string(),
            local_time: Some("19:00".to_string()),
            venue: Some(Venue { name: "The Loft".to_string() }),
            link: "https://meetup.com/rust-enthusiasts/events/e1".to_string(),
        }
    }

    #[test]
    fn status_body_is_deterministic() {
        let now = DateTime::from_timestamp(1_765_000_000, 0).unwrap();
        let attendees = [attendee("2", "Brian"), attendee("1", "Ada")];

        let first = status_body(&event(), &attendees, now);
        let second = status_body(&event(), &attendees, now);

        assert_eq!(first, second);
    }

    #[test]
    fn status_body_renders_core_fields() {
        let now = DateTime::from_timestamp(1_765_000_000, 0).unwrap();

        let body = status_body(&event(), &[attendee("1", "Ada")], now);

        assert!(body.contains("# 📅 Monthly Hack Night"));
        assert!(body.contains("**Date:** Thursday, August 20, 2026"));
        assert!(body.contains("**Time:** 07:00 PM"));
        assert!(body.contains("**Location:** The Loft"));
        assert!(body.contains("**Event Link:** https://meetup.com/rust-enthusiasts/events/e1"));
        assert!(body.contains("## Attendees (1)"));
        assert!(body.contains("- Ada"));
        assert!(body.contains("_Last updated:"));
    }

    #[test]
    fn attendee_order_ignores_fetch_order_and_case() {
        let forward = [attendee("1", "ada"), attendee("2", "Brian"), attendee("3", "carol")];
        let backward = [attendee("3", "carol"), attendee("2", "Brian"), attendee("1", "ada")];

        let sorted_forward: Vec<String> = sorted_attendees(&forward).into_iter().map(|a| a.name).collect();
        let sorted_backward: Vec<String> = sorted_attendees(&backward).into_iter().map(|a| a.name).collect();

        assert_eq!(sorted_forward, vec!["ada", "Brian", "carol"]);
        assert_eq!(sorted_forward, sorted_backward);
    }

    #[test]
    fn attendee_order_breaks_name_ties_by_id() {
        let attendees = [attendee("20", "Ada"), attendee("3", "Ada")];

        let sorted: Vec<String> = sorted_attendees(&attendees).into_iter().map(|a| a.id).collect();

        // Lexicographic id order.
        assert_eq!(sorted, vec!["20", "3"]);
    }

    #[test]
    fn empty_attendee_list_renders_placeholder() {
        let now = DateTime::from_timestamp(1_765_000_000, 0).unwrap();

        let body = status_body(&event(), &[], now);

        assert!(body.contains("## Attendees (0)"));
        assert!(body.contains("No one has RSVP'd yet. Be the first!"));
    }

    #[test]
    fn missing_time_and_venue_render_tba() {
        let now = DateTime::from_timestamp(1_765_000_000, 0).unwrap();
        let mut event = event();
        event.local_time = None;
        event.venue = None;

        let body = status_body(&event, &[], now);

        assert!(body.contains("**Time:** TBA"));
        assert!(body.contains("**Location:** TBA"));
    }

    #[test]
    fn new_event_body_invites_rsvps() {
        let body = new_event_body(&event());

        assert!(body.contains("# 🆕 New Meetup Event: Monthly Hack Night"));
        assert!(body.contains("Use the link above to RSVP!"));
    }

    #[test]
    fn addition_line_names_attendee_and_event() {
        let line = addition_line("Monthly Hack Night", &attendee("1", "Ada"));

        assert_eq!(line, "🎉 **Ada** just RSVP'd yes to **Monthly Hack Night**!");
    }
}
