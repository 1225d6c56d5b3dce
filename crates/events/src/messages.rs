//! Notification text for each event type.

use crate::bus::{event_types, EventSubject, PlatformEvent};
use crate::error::EventError;

/// Title and body shown in the in-app inbox and sent over WhatsApp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub title: String,
    pub body: String,
}

pub fn render(event: &PlatformEvent) -> Result<RenderedMessage, EventError> {
    match (&event.subject, event.event_type.as_str()) {
        (EventSubject::Request(r), event_types::REQUEST_SUBMITTED) => Ok(RenderedMessage {
            title: format!("New request {}", r.reference_number),
            body: format!("\"{}\" is waiting for your decision.", r.title),
        }),
        (EventSubject::Request(r), event_types::REQUEST_ADVANCED) => Ok(RenderedMessage {
            title: format!("Request {} needs your decision", r.reference_number),
            body: format!(
                "\"{}\" moved to step {} and is waiting for your decision.",
                r.title, r.current_step
            ),
        }),
        (EventSubject::Request(r), event_types::REQUEST_RESUBMITTED) => Ok(RenderedMessage {
            title: format!("Request {} was resubmitted", r.reference_number),
            body: format!("\"{}\" was corrected and is back at step {}.", r.title, r.current_step),
        }),
        (EventSubject::Request(r), event_types::REQUEST_APPROVED) => Ok(RenderedMessage {
            title: format!("Request {} approved", r.reference_number),
            body: with_comment(format!("\"{}\" has been approved.", r.title), &r.comment),
        }),
        (EventSubject::Request(r), event_types::REQUEST_REJECTED) => Ok(RenderedMessage {
            title: format!("Request {} rejected", r.reference_number),
            body: with_comment(format!("\"{}\" has been rejected.", r.title), &r.comment),
        }),
        (EventSubject::Request(r), event_types::REQUEST_RETURNED) => Ok(RenderedMessage {
            title: format!("Request {} returned for changes", r.reference_number),
            body: with_comment(
                format!("\"{}\" was sent back to you for changes.", r.title),
                &r.comment,
            ),
        }),
        (EventSubject::Delegation(d), event_types::DELEGATION_APPROVED) => Ok(RenderedMessage {
            title: "Delegation approved".to_string(),
            body: format!(
                "You may act on behalf of user #{} from {} until {} (UTC).",
                d.grantor_id,
                d.starts_at.format("%Y-%m-%d %H:%M"),
                d.ends_at.format("%Y-%m-%d %H:%M"),
            ),
        }),
        (_, other) => Err(EventError::Unsupported(other.to_string())),
    }
}

fn with_comment(text: String, comment: &Option<String>) -> String {
    match comment {
        Some(c) => format!("{text} Comment: {c}"),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::tests::snapshot;
    use crate::bus::DelegationSnapshot;
    use chrono::TimeZone;
    use unicorr_core::request_status::RequestStatus;

    #[test]
    fn decisions_carry_the_comment() {
        let mut snap = snapshot(RequestStatus::Returned);
        snap.comment = Some("Attach the medical report".to_string());
        let msg = render(&PlatformEvent::request(event_types::REQUEST_RETURNED, snap)).unwrap();
        assert_eq!(msg.title, "Request LEAVE-2026-000042 returned for changes");
        assert!(msg.body.ends_with("Comment: Attach the medical report"));
    }

    #[test]
    fn advanced_names_the_step() {
        let msg = render(&PlatformEvent::request(
            event_types::REQUEST_ADVANCED,
            snapshot(RequestStatus::Processing),
        ))
        .unwrap();
        assert!(msg.body.contains("step 2"));
    }

    #[test]
    fn delegation_message_shows_window() {
        let event = PlatformEvent::delegation(
            event_types::DELEGATION_APPROVED,
            DelegationSnapshot {
                delegation_id: 1,
                grantor_id: 5,
                grantee_id: 6,
                starts_at: chrono::Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
                ends_at: chrono::Utc.with_ymd_and_hms(2026, 3, 8, 8, 0, 0).unwrap(),
            },
        );
        let msg = render(&event).unwrap();
        assert!(msg.body.contains("user #5 from 2026-03-01 08:00 until 2026-03-08 08:00"));
    }

    #[test]
    fn mismatched_subject_is_unsupported() {
        let event = PlatformEvent::request(
            event_types::DELEGATION_APPROVED,
            snapshot(RequestStatus::Approved),
        );
        assert!(matches!(render(&event), Err(EventError::Unsupported(_))));
    }
}
