//! Admin handlers for the audit log.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use unicorr_core::audit::verify_chain;
use unicorr_db::models::audit::{AuditLog, AuditQuery};
use unicorr_db::repositories::AuditLogRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/audit-logs
///
/// Filters: `actor_id`, `action_type`, `entity_type`, `entity_id`, `from`,
/// `to`, plus `limit`/`offset`. Newest first.
pub async fn query_audit_logs(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    let logs = AuditLogRepo::query(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: logs }))
}

/// GET /api/v1/admin/audit-logs/verify
///
/// Recompute the hash chain from the first entry.
pub async fn verify_audit_chain(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let chain = AuditLogRepo::fetch_chain(&state.pool).await?;
    let links: Vec<_> = chain.iter().map(AuditLog::to_chain_link).collect();
    let result = verify_chain(&links);

    if result.valid {
        tracing::info!(user_id = admin.user_id, checked = result.checked, "Audit chain verified");
    } else {
        tracing::warn!(
            user_id = admin.user_id,
            first_broken_id = ?result.first_broken_id,
            "Audit chain integrity check failed"
        );
    }
    Ok(Json(DataResponse { data: result }))
}
