//! Producer side of the `whatsapp_queue` table. Delivery belongs to the bot.

use sqlx::PgPool;
use unicorr_core::types::DbId;

use crate::models::whatsapp::{NewWhatsAppMessage, WhatsAppMessage, QUEUE_STATUS_PENDING};

const COLUMNS: &str =
    "id, user_id, phone, message, event_type, status, attempts, created_at, sent_at";

pub struct WhatsAppQueueRepo;

impl WhatsAppQueueRepo {
    pub async fn enqueue(
        pool: &PgPool,
        input: &NewWhatsAppMessage,
    ) -> Result<WhatsAppMessage, sqlx::Error> {
        let query = format!(
            "INSERT INTO whatsapp_queue (user_id, phone, message, event_type, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WhatsAppMessage>(&query)
            .bind(input.user_id)
            .bind(&input.phone)
            .bind(&input.message)
            .bind(&input.event_type)
            .bind(QUEUE_STATUS_PENDING)
            .fetch_one(pool)
            .await
    }

    pub async fn list_pending_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<WhatsAppMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM whatsapp_queue
             WHERE user_id = $1 AND status = $2
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, WhatsAppMessage>(&query)
            .bind(user_id)
            .bind(QUEUE_STATUS_PENDING)
            .fetch_all(pool)
            .await
    }
}
