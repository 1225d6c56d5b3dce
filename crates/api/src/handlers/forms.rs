//! Handlers for browsing form templates and managing them as an admin.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use unicorr_core::audit::{action_types, entity_types};
use unicorr_core::error::CoreError;
use unicorr_core::forms;
use unicorr_core::roles::is_known_role;
use unicorr_core::types::DbId;
use unicorr_db::models::audit::NewAuditLog;
use unicorr_db::models::form_template::{CreateFormTemplate, UpdateFormTemplate};
use unicorr_db::repositories::{FormTemplateRepo, WorkflowRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn validate_allowed_roles(roles: &[String]) -> AppResult<()> {
    if let Some(unknown) = roles.iter().find(|r| !is_known_role(r)) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown role '{unknown}' in allowed_roles"
        ))));
    }
    Ok(())
}

async fn ensure_workflow_exists(state: &AppState, id: DbId) -> AppResult<()> {
    WorkflowRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Workflow",
            id,
        }))?;
    Ok(())
}

/// GET /api/v1/forms
///
/// Templates open for submission.
pub async fn list_forms(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let templates = FormTemplateRepo::list_active(&state.pool).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// GET /api/v1/forms/{id}
pub async fn get_form(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let template = FormTemplateRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "FormTemplate",
            id,
        }))?;
    Ok(Json(DataResponse { data: template }))
}

/// POST /api/v1/admin/forms
pub async fn create_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateFormTemplate>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    forms::validate_template_code(input.code.trim())?;
    forms::parse_schema(&input.fields)?;
    validate_allowed_roles(&input.allowed_roles)?;
    ensure_workflow_exists(&state, input.workflow_id).await?;

    let audit = NewAuditLog {
        action_type: action_types::FORM_CHANGE,
        entity_type: entity_types::FORM_TEMPLATE,
        entity_id: None,
        actor_id: Some(admin.user_id),
        details: json!({
            "change": "create",
            "code": input.code.trim().to_uppercase(),
            "workflow_id": input.workflow_id,
        }),
    };
    let template = FormTemplateRepo::create(&state.pool, &input, audit).await?;

    tracing::info!(
        user_id = admin.user_id,
        form_template_id = template.id,
        code = %template.code,
        "Form template created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: template })))
}

/// PUT /api/v1/admin/forms/{id}
pub async fn update_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateFormTemplate>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(fields) = &input.fields {
        forms::parse_schema(fields)?;
    }
    if let Some(roles) = &input.allowed_roles {
        validate_allowed_roles(roles)?;
    }
    if let Some(workflow_id) = input.workflow_id {
        ensure_workflow_exists(&state, workflow_id).await?;
    }

    let audit = NewAuditLog {
        action_type: action_types::FORM_CHANGE,
        entity_type: entity_types::FORM_TEMPLATE,
        entity_id: Some(id),
        actor_id: Some(admin.user_id),
        details: json!({
            "change": "update",
            "fields_changed": input.fields.is_some(),
            "workflow_id": input.workflow_id,
            "is_active": input.is_active,
        }),
    };
    let template = FormTemplateRepo::update(&state.pool, id, &input, audit)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "FormTemplate",
            id,
        }))?;

    tracing::info!(user_id = admin.user_id, form_template_id = id, "Form template updated");
    Ok(Json(DataResponse { data: template }))
}
