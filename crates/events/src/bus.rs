//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Handlers publish a [`PlatformEvent`] once their transaction has committed;
//! the notification router subscribes and fans it out to users. Shared as
//! `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use unicorr_core::request_status::RequestStatus;
use unicorr_core::types::{DbId, Timestamp};

/// Dot-separated event names.
pub mod event_types {
    pub const REQUEST_SUBMITTED: &str = "request.submitted";
    pub const REQUEST_ADVANCED: &str = "request.advanced";
    pub const REQUEST_APPROVED: &str = "request.approved";
    pub const REQUEST_REJECTED: &str = "request.rejected";
    pub const REQUEST_RETURNED: &str = "request.returned";
    pub const REQUEST_RESUBMITTED: &str = "request.resubmitted";
    pub const DELEGATION_APPROVED: &str = "delegation.approved";
}

/// The request as it stood right after the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub request_id: DbId,
    pub reference_number: String,
    pub title: String,
    pub requester_id: DbId,
    pub workflow_id: DbId,
    pub current_step: i32,
    pub status: RequestStatus,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationSnapshot {
    pub delegation_id: DbId,
    pub grantor_id: DbId,
    pub grantee_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

/// What an event is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventSubject {
    Request(RequestSnapshot),
    Delegation(DelegationSnapshot),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// One of [`event_types`].
    pub event_type: String,
    pub subject: EventSubject,
    /// The user whose action produced the event.
    pub actor_user_id: Option<DbId>,
    pub occurred_at: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>, subject: EventSubject) -> Self {
        Self {
            event_type: event_type.into(),
            subject,
            actor_user_id: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn request(event_type: impl Into<String>, snapshot: RequestSnapshot) -> Self {
        Self::new(event_type, EventSubject::Request(snapshot))
    }

    pub fn delegation(event_type: impl Into<String>, snapshot: DelegationSnapshot) -> Self {
        Self::new(event_type, EventSubject::Delegation(snapshot))
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// The request this event concerns, if any.
    pub fn request_id(&self) -> Option<DbId> {
        match &self.subject {
            EventSubject::Request(r) => Some(r.request_id),
            EventSubject::Delegation(_) => None,
        }
    }
}

/// Buffer capacity of the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus. Every subscriber sees every event.
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers; dropped if there are none.
    pub fn publish(&self, event: PlatformEvent) {
        let event_type = event.event_type.clone();
        if self.sender.send(event).is_err() {
            tracing::debug!(event_type = %event_type, "No subscribers for event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn snapshot(status: RequestStatus) -> RequestSnapshot {
        RequestSnapshot {
            request_id: 42,
            reference_number: "LEAVE-2026-000042".to_string(),
            title: "Annual leave".to_string(),
            requester_id: 7,
            workflow_id: 3,
            current_step: 2,
            status,
            comment: None,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            PlatformEvent::request(event_types::REQUEST_ADVANCED, snapshot(RequestStatus::Processing))
                .with_actor(9),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, event_types::REQUEST_ADVANCED);
        assert_eq!(received.actor_user_id, Some(9));
        assert_eq!(received.request_id(), Some(42));
    }

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(PlatformEvent::request(
            event_types::REQUEST_SUBMITTED,
            snapshot(RequestStatus::Pending),
        ));

        assert_eq!(rx1.recv().await.unwrap().event_type, event_types::REQUEST_SUBMITTED);
        assert_eq!(rx2.recv().await.unwrap().event_type, event_types::REQUEST_SUBMITTED);
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(PlatformEvent::request(
            event_types::REQUEST_APPROVED,
            snapshot(RequestStatus::Approved),
        ));
    }

    #[test]
    fn subject_serializes_with_kind_tag() {
        let event = PlatformEvent::request(
            event_types::REQUEST_RETURNED,
            snapshot(RequestStatus::Returned),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["subject"]["kind"], "request");
        assert_eq!(value["subject"]["status"], "returned");
        assert_eq!(value["actor_user_id"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn slow_receiver_observes_lag() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..4 {
            bus.publish(PlatformEvent::request(
                event_types::REQUEST_SUBMITTED,
                snapshot(RequestStatus::Pending),
            ));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
    }
}
