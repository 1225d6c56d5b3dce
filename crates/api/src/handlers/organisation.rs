//! Admin handlers for roles, colleges and departments.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use unicorr_core::audit::{action_types, entity_types};
use unicorr_core::error::CoreError;
use unicorr_db::models::audit::NewAuditLog;
use unicorr_db::models::organisation::{CreateCollege, CreateDepartment};
use unicorr_db::repositories::{AuditLogRepo, CollegeRepo, DepartmentRepo, RoleRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::DepartmentListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/roles
pub async fn list_roles(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let roles = RoleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: roles }))
}

/// GET /api/v1/admin/colleges
pub async fn list_colleges(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let colleges = CollegeRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: colleges }))
}

/// POST /api/v1/admin/colleges
pub async fn create_college(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateCollege>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let college = CollegeRepo::create(&state.pool, &input).await?;
    AuditLogRepo::append(
        &state.pool,
        NewAuditLog {
            action_type: action_types::ORGANISATION_CHANGE,
            entity_type: entity_types::COLLEGE,
            entity_id: Some(college.id),
            actor_id: Some(admin.user_id),
            details: json!({ "change": "create", "name": college.name }),
        },
    )
    .await?;

    tracing::info!(user_id = admin.user_id, college_id = college.id, "College created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: college })))
}

/// GET /api/v1/admin/departments?college_id=
pub async fn list_departments(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<DepartmentListParams>,
) -> AppResult<impl IntoResponse> {
    let departments = DepartmentRepo::list(&state.pool, params.college_id).await?;
    Ok(Json(DataResponse { data: departments }))
}

/// POST /api/v1/admin/departments
pub async fn create_department(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateDepartment>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if !CollegeRepo::exists(&state.pool, input.college_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "College",
            id: input.college_id,
        }));
    }

    let department = DepartmentRepo::create(&state.pool, &input).await?;
    AuditLogRepo::append(
        &state.pool,
        NewAuditLog {
            action_type: action_types::ORGANISATION_CHANGE,
            entity_type: entity_types::DEPARTMENT,
            entity_id: Some(department.id),
            actor_id: Some(admin.user_id),
            details: json!({
                "change": "create",
                "name": department.name,
                "college_id": department.college_id,
            }),
        },
    )
    .await?;

    tracing::info!(user_id = admin.user_id, department_id = department.id, "Department created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: department })))
}
