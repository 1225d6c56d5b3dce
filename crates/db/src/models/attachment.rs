use serde::Serialize;
use sqlx::FromRow;
use unicorr_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attachment {
    pub id: DbId,
    pub request_id: DbId,
    pub uploaded_by: DbId,
    pub original_name: String,
    pub stored_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    /// Relative URL under `/uploads`.
    pub url: String,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct NewAttachment<'a> {
    pub request_id: DbId,
    pub uploaded_by: DbId,
    pub original_name: &'a str,
    pub stored_name: &'a str,
    pub content_type: Option<&'a str>,
    pub size_bytes: i64,
    pub url: &'a str,
}
