//! Admin handlers for workflow templates and their approval chains.

use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use unicorr_core::audit::{action_types, entity_types};
use unicorr_core::error::CoreError;
use unicorr_core::types::DbId;
use unicorr_core::workflow::{validate_chain, StepDefinition};
use unicorr_db::models::audit::NewAuditLog;
use unicorr_db::models::workflow::{CreateWorkflow, ReplaceSteps, UpdateWorkflow, WorkflowDetail};
use unicorr_db::repositories::workflow_repo::ReplaceStepsOutcome;
use unicorr_db::repositories::{AuditLogRepo, UserRepo, WorkflowRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Validate the chain and make sure every named approver user exists and is
/// active.
async fn validate_steps(state: &AppState, steps: &[StepDefinition]) -> AppResult<()> {
    validate_chain(steps)?;

    let user_ids: Vec<DbId> = steps
        .iter()
        .filter_map(|s| s.approver_user_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if user_ids.is_empty() {
        return Ok(());
    }
    let found = UserRepo::find_many(&state.pool, &user_ids).await?;
    for id in user_ids {
        match found.iter().find(|u| u.id == id) {
            Some(user) if user.is_active => {}
            Some(_) => {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Approver user {id} is deactivated"
                ))))
            }
            None => return Err(AppError::Core(CoreError::NotFound { entity: "User", id })),
        }
    }
    Ok(())
}

fn step_summary(steps: &[StepDefinition]) -> serde_json::Value {
    json!(steps
        .iter()
        .map(|s| json!({
            "step_number": s.step_number,
            "approver_role": s.approver_role,
            "approver_user_id": s.approver_user_id,
            "sla_hours": s.sla_hours,
        }))
        .collect::<Vec<_>>())
}

async fn load_detail(state: &AppState, id: DbId) -> AppResult<WorkflowDetail> {
    let workflow = WorkflowRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Workflow",
            id,
        }))?;
    let steps = WorkflowRepo::list_steps(&state.pool, id).await?;
    Ok(WorkflowDetail { workflow, steps })
}

/// GET /api/v1/admin/workflows
pub async fn list_workflows(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let workflows = WorkflowRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: workflows }))
}

/// GET /api/v1/admin/workflows/{id}
pub async fn get_workflow(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = load_detail(&state, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/admin/workflows
pub async fn create_workflow(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateWorkflow>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_steps(&state, &input.steps).await?;

    let audit = NewAuditLog {
        action_type: action_types::WORKFLOW_CHANGE,
        entity_type: entity_types::WORKFLOW,
        entity_id: None,
        actor_id: Some(admin.user_id),
        details: json!({
            "change": "create",
            "name": input.name.trim(),
            "steps": step_summary(&input.steps),
        }),
    };
    let (workflow, steps) =
        WorkflowRepo::create(&state.pool, &input, admin.user_id, audit).await?;

    tracing::info!(
        user_id = admin.user_id,
        workflow_id = workflow.id,
        steps = steps.len(),
        "Workflow created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: WorkflowDetail { workflow, steps },
        }),
    ))
}

/// PUT /api/v1/admin/workflows/{id}
///
/// Rename, redescribe or (de)activate. Steps are replaced separately.
pub async fn update_workflow(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWorkflow>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let workflow = WorkflowRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Workflow",
            id,
        }))?;
    AuditLogRepo::append(
        &state.pool,
        NewAuditLog {
            action_type: action_types::WORKFLOW_CHANGE,
            entity_type: entity_types::WORKFLOW,
            entity_id: Some(id),
            actor_id: Some(admin.user_id),
            details: json!({
                "change": "update",
                "name": input.name,
                "is_active": input.is_active,
            }),
        },
    )
    .await?;

    tracing::info!(user_id = admin.user_id, workflow_id = id, "Workflow updated");
    Ok(Json(DataResponse { data: workflow }))
}

/// PUT /api/v1/admin/workflows/{id}/steps
///
/// Refused with 409 while any request is still travelling the workflow.
pub async fn replace_steps(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReplaceSteps>,
) -> AppResult<impl IntoResponse> {
    validate_steps(&state, &input.steps).await?;

    let audit = NewAuditLog {
        action_type: action_types::WORKFLOW_CHANGE,
        entity_type: entity_types::WORKFLOW,
        entity_id: Some(id),
        actor_id: Some(admin.user_id),
        details: json!({
            "change": "replace_steps",
            "steps": step_summary(&input.steps),
        }),
    };
    match WorkflowRepo::replace_steps(&state.pool, id, &input.steps, audit).await? {
        ReplaceStepsOutcome::Replaced(steps) => {
            tracing::info!(
                user_id = admin.user_id,
                workflow_id = id,
                steps = steps.len(),
                "Workflow steps replaced"
            );
            let detail = load_detail(&state, id).await?;
            Ok(Json(DataResponse { data: detail }))
        }
        ReplaceStepsOutcome::NotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "Workflow",
            id,
        })),
        ReplaceStepsOutcome::InFlight(count) => Err(AppError::Core(CoreError::Conflict(format!(
            "{count} request(s) are still in flight on this workflow"
        )))),
    }
}
