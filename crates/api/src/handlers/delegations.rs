//! Handlers for delegations of approval authority.
//!
//! Any user may ask to delegate their own authority; an admin approves or
//! rejects, and the grantor or an admin may revoke.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use unicorr_core::audit::{action_types, entity_types};
use unicorr_core::delegation::{self, DelegationStatus, DelegationTransition};
use unicorr_core::error::CoreError;
use unicorr_core::roles::ROLE_ADMIN;
use unicorr_core::types::DbId;
use unicorr_db::models::audit::NewAuditLog;
use unicorr_db::models::delegation::{CreateDelegation, Delegation, DelegationListQuery};
use unicorr_db::repositories::delegation_repo::CreateDelegationOutcome;
use unicorr_db::repositories::DelegationRepo;
use unicorr_events::{event_types, DelegationSnapshot, PlatformEvent};
use validator::Validate;

use crate::approvals;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

async fn find_delegation(state: &AppState, id: DbId) -> AppResult<Delegation> {
    DelegationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Delegation",
            id,
        }))
}

fn audit_action(requested: DelegationTransition) -> &'static str {
    match requested {
        DelegationTransition::Approve => action_types::DELEGATION_APPROVE,
        DelegationTransition::Reject => action_types::DELEGATION_REJECT,
        DelegationTransition::Revoke => action_types::DELEGATION_REVOKE,
    }
}

/// Check and persist a status change, refusing if the row moved meanwhile.
async fn apply_transition(
    state: &AppState,
    current: &Delegation,
    requested: DelegationTransition,
    reviewer_id: DbId,
) -> AppResult<Delegation> {
    let from = current.status()?;
    let to = delegation::transition(from, requested)?;

    let audit = NewAuditLog {
        action_type: audit_action(requested),
        entity_type: entity_types::DELEGATION,
        entity_id: Some(current.id),
        actor_id: Some(reviewer_id),
        details: json!({
            "from_status": from.as_str(),
            "to_status": to.as_str(),
            "grantor_id": current.grantor_id,
            "grantee_id": current.grantee_id,
        }),
    };
    DelegationRepo::transition(&state.pool, current.id, from, to, reviewer_id, audit)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Delegation was changed by someone else; reload and try again".into(),
            ))
        })
}

/// POST /api/v1/delegations
///
/// The caller is the grantor. The delegation starts out pending.
pub async fn create_delegation(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDelegation>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    delegation::validate_new(
        auth.user_id,
        input.grantee_id,
        input.starts_at,
        input.ends_at,
        chrono::Utc::now(),
    )?;

    let grantor = approvals::load_user(&state.pool, auth.user_id).await?;
    if !grantor.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }
    let grantee = approvals::load_user(&state.pool, input.grantee_id).await?;
    if !grantee.is_active {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot delegate to a deactivated user".into(),
        )));
    }

    let audit = NewAuditLog {
        action_type: action_types::DELEGATION_CREATE,
        entity_type: entity_types::DELEGATION,
        entity_id: None,
        actor_id: Some(auth.user_id),
        details: json!({
            "grantee_id": input.grantee_id,
            "starts_at": input.starts_at,
            "ends_at": input.ends_at,
        }),
    };
    let created = match DelegationRepo::create(&state.pool, auth.user_id, &input, audit).await? {
        CreateDelegationOutcome::Created(d) => d,
        CreateDelegationOutcome::Overlaps(existing) => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Overlaps your delegation {existing}"
            ))));
        }
    };

    tracing::info!(
        user_id = auth.user_id,
        delegation_id = created.id,
        grantee_id = created.grantee_id,
        "Delegation requested"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/delegations/mine
pub async fn list_my_delegations(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let delegations = DelegationRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: delegations }))
}

/// POST /api/v1/delegations/{id}/revoke
pub async fn revoke_delegation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let current = find_delegation(&state, id).await?;
    if current.grantor_id != auth.user_id && auth.role != ROLE_ADMIN {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the grantor or an admin can revoke a delegation".into(),
        )));
    }

    let revoked = apply_transition(&state, &current, DelegationTransition::Revoke, auth.user_id)
        .await?;
    tracing::info!(user_id = auth.user_id, delegation_id = id, "Delegation revoked");
    Ok(Json(DataResponse { data: revoked }))
}

/// GET /api/v1/admin/delegations
pub async fn list_delegations(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<DelegationListQuery>,
) -> AppResult<impl IntoResponse> {
    let status = params
        .status
        .as_deref()
        .map(DelegationStatus::parse)
        .transpose()?;
    let paging = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let delegations = DelegationRepo::list(
        &state.pool,
        status.as_ref().map(DelegationStatus::as_str),
        paging.limit(),
        paging.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: delegations }))
}

/// POST /api/v1/admin/delegations/{id}/approve
pub async fn approve_delegation(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let current = find_delegation(&state, id).await?;
    let approved =
        apply_transition(&state, &current, DelegationTransition::Approve, admin.user_id).await?;

    tracing::info!(
        user_id = admin.user_id,
        delegation_id = id,
        grantor_id = approved.grantor_id,
        grantee_id = approved.grantee_id,
        "Delegation approved"
    );

    state.event_bus.publish(
        PlatformEvent::delegation(
            event_types::DELEGATION_APPROVED,
            DelegationSnapshot {
                delegation_id: approved.id,
                grantor_id: approved.grantor_id,
                grantee_id: approved.grantee_id,
                starts_at: approved.starts_at,
                ends_at: approved.ends_at,
            },
        )
        .with_actor(admin.user_id),
    );

    Ok(Json(DataResponse { data: approved }))
}

/// POST /api/v1/admin/delegations/{id}/reject
pub async fn reject_delegation(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let current = find_delegation(&state, id).await?;
    let rejected =
        apply_transition(&state, &current, DelegationTransition::Reject, admin.user_id).await?;
    tracing::info!(user_id = admin.user_id, delegation_id = id, "Delegation rejected");
    Ok(Json(DataResponse { data: rejected }))
}
