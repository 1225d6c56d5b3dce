//! Handlers for `/requests/{id}/attachments`.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use unicorr_core::audit::{action_types, entity_types};
use unicorr_core::error::CoreError;
use unicorr_core::types::DbId;
use unicorr_db::models::attachment::NewAttachment;
use unicorr_db::models::audit::NewAuditLog;
use unicorr_db::repositories::{AttachmentRepo, RequestActionRepo};
use uuid::Uuid;

use super::requests::{ensure_current_approver, ensure_participant, find_request};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// File extensions accepted for upload (lowercase, without the dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "doc", "docx", "xls", "xlsx", "txt",
];

/// Lowercased extension of `filename` if it is on the allow-list.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

struct UploadedFile {
    original_name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// POST /api/v1/requests/{id}/attachments
///
/// Multipart form with a required `file` field. Allowed for the requester
/// and the current step's approver while the request is still open.
pub async fn upload_attachment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state, request_id).await?;
    if request.status()?.is_terminal() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Request is {} and no longer accepts attachments",
            request.status
        ))));
    }
    if request.requester_id != auth.user_id {
        ensure_current_approver(&state, &auth, &request).await?;
    }

    let mut upload: Option<UploadedFile> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("The 'file' field needs a filename".into()))?;
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some(UploadedFile {
            original_name,
            content_type,
            data: data.to_vec(),
        });
    }

    let file =
        upload.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    if file.data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    if file.data.len() > state.config.max_upload_bytes {
        return Err(AppError::BadRequest(format!(
            "File exceeds the {} byte upload limit",
            state.config.max_upload_bytes
        )));
    }
    let ext = allowed_extension(&file.original_name).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unsupported file type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let stored_name = format!("{}.{ext}", Uuid::new_v4());
    let path = state.config.upload_dir.join(&stored_name);
    tokio::fs::write(&path, &file.data)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let url = format!("/uploads/{stored_name}");
    let size_bytes = file.data.len() as i64;
    let audit = NewAuditLog {
        action_type: action_types::ATTACHMENT_UPLOAD,
        entity_type: entity_types::REQUEST,
        entity_id: Some(request_id),
        actor_id: Some(auth.user_id),
        details: json!({
            "original_name": file.original_name,
            "stored_name": stored_name,
            "size_bytes": size_bytes,
        }),
    };
    let created = AttachmentRepo::create(
        &state.pool,
        &NewAttachment {
            request_id,
            uploaded_by: auth.user_id,
            original_name: &file.original_name,
            stored_name: &stored_name,
            content_type: file.content_type.as_deref(),
            size_bytes,
            url: &url,
        },
        audit,
    )
    .await;

    let attachment = match created {
        Ok(attachment) => attachment,
        Err(e) => {
            if let Err(io) = tokio::fs::remove_file(&path).await {
                tracing::warn!(error = %io, path = %path.display(), "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        user_id = auth.user_id,
        request_id,
        attachment_id = attachment.id,
        size_bytes,
        "Attachment uploaded"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: attachment })))
}

/// GET /api/v1/requests/{id}/attachments
pub async fn list_attachments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state, request_id).await?;
    let actions = RequestActionRepo::list_for_request(&state.pool, request_id).await?;
    ensure_participant(&state, &auth, &request, &actions).await?;

    let attachments = AttachmentRepo::list_for_request(&state.pool, request_id).await?;
    Ok(Json(DataResponse { data: attachments }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(allowed_extension("Report.PDF").as_deref(), Some("pdf"));
        assert_eq!(allowed_extension("scan.final.jpeg").as_deref(), Some("jpeg"));
    }

    #[test]
    fn unknown_or_missing_extensions_are_refused() {
        assert_eq!(allowed_extension("payload.exe"), None);
        assert_eq!(allowed_extension("README"), None);
        assert_eq!(allowed_extension(".pdf"), None);
    }
}
