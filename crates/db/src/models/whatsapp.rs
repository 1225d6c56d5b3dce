//! Outbound WhatsApp messages awaiting the delivery bot.

use serde::Serialize;
use sqlx::FromRow;
use unicorr_core::types::{DbId, Timestamp};

/// Status of a freshly enqueued message; the bot moves it to `sent`/`failed`.
pub const QUEUE_STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WhatsAppMessage {
    pub id: DbId,
    pub user_id: DbId,
    pub phone: String,
    pub message: String,
    pub event_type: String,
    pub status: String,
    pub attempts: i32,
    pub created_at: Timestamp,
    pub sent_at: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct NewWhatsAppMessage {
    pub user_id: DbId,
    pub phone: String,
    pub message: String,
    pub event_type: String,
}
