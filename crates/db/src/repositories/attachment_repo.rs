//! Repository for `attachments`.

use sqlx::PgPool;
use unicorr_core::types::DbId;

use crate::models::attachment::{Attachment, NewAttachment};
use crate::models::audit::NewAuditLog;
use crate::repositories::AuditLogRepo;

const COLUMNS: &str = "id, request_id, uploaded_by, original_name, stored_name, content_type, \
                       size_bytes, url, created_at";

pub struct AttachmentRepo;

impl AttachmentRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewAttachment<'_>,
        audit: NewAuditLog,
    ) -> Result<Attachment, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "INSERT INTO attachments
                (request_id, uploaded_by, original_name, stored_name, content_type, size_bytes, url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let attachment = sqlx::query_as::<_, Attachment>(&query)
            .bind(input.request_id)
            .bind(input.uploaded_by)
            .bind(input.original_name)
            .bind(input.stored_name)
            .bind(input.content_type)
            .bind(input.size_bytes)
            .bind(input.url)
            .fetch_one(&mut *tx)
            .await?;
        AuditLogRepo::append_in(&mut tx, audit).await?;
        tx.commit().await?;
        Ok(attachment)
    }

    pub async fn list_for_request(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<Attachment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attachments WHERE request_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(request_id)
            .fetch_all(pool)
            .await
    }
}
