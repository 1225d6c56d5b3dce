//! Event-driven notification delivery.
//!
//! [`NotificationRouter`] subscribes to the event bus and writes in-app
//! notifications plus WhatsApp queue rows for the affected users.

pub mod router;

pub use router::NotificationRouter;
