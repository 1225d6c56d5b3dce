//! Producer side of the WhatsApp channel.
//!
//! Messages are written to `whatsapp_queue` with status `pending`; an
//! external bot delivers them. Nothing here talks to WhatsApp.

use unicorr_core::channels::CHANNEL_WHATSAPP;
use unicorr_db::models::user::User;
use unicorr_db::models::whatsapp::{NewWhatsAppMessage, WhatsAppMessage};
use unicorr_db::repositories::WhatsAppQueueRepo;
use unicorr_db::DbPool;

use crate::error::EventError;
use crate::messages::RenderedMessage;

/// WhatsApp caps a text message at 4096 characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Plain-text message for a recipient.
pub fn compose(recipient_name: &str, message: &RenderedMessage) -> String {
    let text = format!("Hello {recipient_name},\n*{}*\n{}", message.title, message.body);
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text;
    }
    let mut truncated: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    truncated.push('…');
    truncated
}

/// Writes rendered notifications to the outbound queue.
#[derive(Clone)]
pub struct WhatsAppQueue {
    pool: DbPool,
}

impl WhatsAppQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Enqueue a message for `user` if they have a phone number and opted in.
    ///
    /// Returns `None` when the user is not reachable on this channel.
    pub async fn enqueue(
        &self,
        user: &User,
        event_type: &str,
        message: &RenderedMessage,
    ) -> Result<Option<WhatsAppMessage>, EventError> {
        let Some(phone) = user.whatsapp_phone() else {
            return Ok(None);
        };
        let queued = WhatsAppQueueRepo::enqueue(
            &self.pool,
            &NewWhatsAppMessage {
                user_id: user.id,
                phone: phone.trim().to_string(),
                message: compose(&user.full_name, message),
                event_type: event_type.to_string(),
            },
        )
        .await?;
        tracing::debug!(
            user_id = user.id,
            queue_id = queued.id,
            channel = CHANNEL_WHATSAPP,
            "Message queued",
        );
        Ok(Some(queued))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(body: &str) -> RenderedMessage {
        RenderedMessage {
            title: "Request LEAVE-2026-000001 approved".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn compose_greets_and_bolds_title() {
        let text = compose("Sara", &message("Done."));
        assert_eq!(text, "Hello Sara,\n*Request LEAVE-2026-000001 approved*\nDone.");
    }

    #[test]
    fn compose_truncates_long_messages() {
        let text = compose("Sara", &message(&"x".repeat(5000)));
        assert_eq!(text.chars().count(), MAX_MESSAGE_CHARS);
        assert!(text.ends_with('…'));
    }
}
