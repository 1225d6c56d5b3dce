//! Admin handlers for `/admin/users`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use unicorr_core::audit::{action_types, entity_types};
use unicorr_core::error::CoreError;
use unicorr_core::types::DbId;
use unicorr_db::models::audit::NewAuditLog;
use unicorr_db::models::user::{CreateUser, UpdateUser};
use unicorr_db::repositories::{AuditLogRepo, DepartmentRepo, RoleRepo, UserRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

async fn resolve_role_id(state: &AppState, name: &str) -> AppResult<DbId> {
    let role = RoleRepo::find_by_name(&state.pool, name)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Validation(format!("Unknown role '{name}'"))))?;
    Ok(role.id)
}

async fn ensure_department_exists(state: &AppState, id: DbId) -> AppResult<()> {
    if !DepartmentRepo::exists(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Department",
            id,
        }));
    }
    Ok(())
}

fn user_audit(admin_id: DbId, user_id: DbId, details: serde_json::Value) -> NewAuditLog {
    NewAuditLog {
        action_type: action_types::USER_CHANGE,
        entity_type: entity_types::USER,
        entity_id: Some(user_id),
        actor_id: Some(admin_id),
        details,
    }
}

/// GET /api/v1/admin/users
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let users = UserRepo::list(&state.pool, params.limit(), params.offset()).await?;
    Ok(Json(DataResponse { data: users }))
}

/// POST /api/v1/admin/users
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let role_id = resolve_role_id(&state, &input.role).await?;
    if let Some(department_id) = input.department_id {
        ensure_department_exists(&state, department_id).await?;
    }

    let user = UserRepo::create(&state.pool, &input, role_id).await?;
    AuditLogRepo::append(
        &state.pool,
        user_audit(
            admin.user_id,
            user.id,
            json!({
                "change": "create",
                "email": user.email,
                "role": user.role,
                "department_id": user.department_id,
            }),
        ),
    )
    .await?;

    tracing::info!(user_id = admin.user_id, created_user_id = user.id, role = %user.role, "User created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let role_id = match input.role.as_deref() {
        Some(name) => Some(resolve_role_id(&state, name).await?),
        None => None,
    };
    if let Some(department_id) = input.department_id {
        ensure_department_exists(&state, department_id).await?;
    }

    let user = UserRepo::update(&state.pool, id, &input, role_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    AuditLogRepo::append(
        &state.pool,
        user_audit(
            admin.user_id,
            id,
            json!({
                "change": "update",
                "role": input.role,
                "department_id": input.department_id,
                "is_active": input.is_active,
            }),
        ),
    )
    .await?;

    tracing::info!(user_id = admin.user_id, updated_user_id = id, "User updated");
    Ok(Json(DataResponse { data: user }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Soft delete: the user is deactivated and keeps their history.
pub async fn deactivate_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Validation(
            "You cannot deactivate your own account".into(),
        )));
    }
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    if UserRepo::deactivate(&state.pool, id).await? {
        AuditLogRepo::append(
            &state.pool,
            user_audit(admin.user_id, id, json!({ "change": "deactivate" })),
        )
        .await?;
        tracing::info!(user_id = admin.user_id, deactivated_user_id = id, "User deactivated");
    }
    Ok(StatusCode::NO_CONTENT)
}
