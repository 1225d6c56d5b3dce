//! Event bus and outbound notification plumbing.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the envelope handlers publish after a state change.
//! - [`messages`]: renders an event into notification text.
//! - [`whatsapp`]: writes rendered messages to the outbound WhatsApp queue.

pub mod bus;
pub mod error;
pub mod messages;
pub mod whatsapp;

pub use bus::{event_types, DelegationSnapshot, EventBus, EventSubject, PlatformEvent, RequestSnapshot};
pub use error::EventError;
pub use whatsapp::WhatsAppQueue;
