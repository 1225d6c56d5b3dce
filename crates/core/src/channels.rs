//! Well-known notification channel name constants.
//!
//! These must match the values stored in the `notifications.channel` column.

/// In-app notification shown in the user's inbox.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Message document queued in `whatsapp_queue` for the external bot.
pub const CHANNEL_WHATSAPP: &str = "whatsapp";
