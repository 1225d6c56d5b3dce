//! Handlers for `/requests`: submission, inboxes, detail, approver actions
//! and resubmission.

use std::collections::{BTreeSet, HashMap};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use unicorr_core::audit::{action_types, entity_types};
use unicorr_core::authority::{self, Authority};
use unicorr_core::error::CoreError;
use unicorr_core::forms;
use unicorr_core::request_status::{status_matches_last_action, ActionKind, RequestStatus};
use unicorr_core::roles::ROLE_ADMIN;
use unicorr_core::sla::{self, CurrentSla, SlaSample};
use unicorr_core::types::DbId;
use unicorr_core::workflow_engine::{self, Transition};
use unicorr_db::models::attachment::Attachment;
use unicorr_db::models::audit::NewAuditLog;
use unicorr_db::models::request::{
    NewRequest, Request, RequestListQuery, ResubmitRequest, SubmitRequest, WaitingRequest,
};
use unicorr_db::models::request_action::{ActOnRequest, NewAction, RequestAction};
use unicorr_db::models::user::User;
use unicorr_db::models::workflow::WorkflowStep;
use unicorr_db::repositories::{
    AttachmentRepo, FormTemplateRepo, RequestActionRepo, RequestRepo, UserRepo, WorkflowRepo,
};
use unicorr_events::{event_types, PlatformEvent, RequestSnapshot};
use validator::Validate;

use crate::approvals;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A request in an approver's inbox.
#[derive(Debug, Serialize)]
pub struct InboxItem {
    #[serde(flatten)]
    pub request: WaitingRequest,
    /// Whether the caller acts directly or for a grantor.
    pub acting_as: Authority,
    pub sla: CurrentSla,
}

#[derive(Debug, Serialize)]
pub struct OverdueItem {
    #[serde(flatten)]
    pub request: WaitingRequest,
    pub sla: CurrentSla,
}

#[derive(Debug, Serialize)]
pub struct RequestSla {
    /// Present while the request waits for a decision.
    pub current: Option<CurrentSla>,
    pub history: Vec<SlaSample>,
}

#[derive(Debug, Serialize)]
pub struct RequestDetail {
    pub request: Request,
    pub steps: Vec<WorkflowStep>,
    pub actions: Vec<RequestAction>,
    pub attachments: Vec<Attachment>,
    pub sla: RequestSla,
}

#[derive(Debug, Serialize)]
pub struct ActionOutcome {
    pub request: Request,
    pub action: RequestAction,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn find_request(state: &AppState, id: DbId) -> AppResult<Request> {
    RequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Request",
            id,
        }))
}

fn snapshot(request: &Request, comment: Option<String>) -> AppResult<RequestSnapshot> {
    Ok(RequestSnapshot {
        request_id: request.id,
        reference_number: request.reference_number.clone(),
        title: request.title.clone(),
        requester_id: request.requester_id,
        workflow_id: request.workflow_id,
        current_step: request.current_step,
        status: request.status()?,
        comment,
    })
}

fn ensure_active(user: &User) -> AppResult<()> {
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }
    Ok(())
}

/// Event published after a decision, keyed by where it left the request.
fn decision_event(to_status: RequestStatus) -> &'static str {
    match to_status {
        RequestStatus::Approved => event_types::REQUEST_APPROVED,
        RequestStatus::Rejected => event_types::REQUEST_REJECTED,
        RequestStatus::Returned => event_types::REQUEST_RETURNED,
        RequestStatus::Pending | RequestStatus::Processing => event_types::REQUEST_ADVANCED,
    }
}

fn transition_details(transition: &Transition, extra: serde_json::Value) -> serde_json::Value {
    let mut details = json!({
        "action": transition.action.as_str(),
        "from_status": transition.from_status.as_str(),
        "to_status": transition.to_status.as_str(),
        "from_step": transition.from_step,
        "to_step": transition.to_step,
    });
    if let (Some(target), serde_json::Value::Object(more)) = (details.as_object_mut(), extra) {
        target.extend(more);
    }
    details
}

fn stale_request() -> AppError {
    AppError::Core(CoreError::Conflict(
        "Request was changed by someone else; reload and try again".into(),
    ))
}

/// Requester, admin, anyone who already acted on the request, or the
/// current step's approver may look at it.
pub(crate) async fn ensure_participant(
    state: &AppState,
    auth: &AuthUser,
    request: &Request,
    actions: &[RequestAction],
) -> AppResult<()> {
    if request.requester_id == auth.user_id || auth.role == ROLE_ADMIN {
        return Ok(());
    }
    if actions
        .iter()
        .any(|a| a.actor_id == auth.user_id || a.on_behalf_of == Some(auth.user_id))
    {
        return Ok(());
    }
    if request.status()?.is_actionable() {
        ensure_current_approver(state, auth, request).await?;
        return Ok(());
    }
    Err(AppError::Core(CoreError::Forbidden(
        "You are not a participant of this request".into(),
    )))
}

/// Resolve the caller's authority over the request's current step.
pub(crate) async fn ensure_current_approver(
    state: &AppState,
    auth: &AuthUser,
    request: &Request,
) -> AppResult<Authority> {
    let actor = approvals::load_user(&state.pool, auth.user_id).await?;
    let requester = approvals::load_user(&state.pool, request.requester_id).await?;
    let (step, _) = approvals::current_step(&state.pool, request).await?;
    approvals::resolve_authority(&state.pool, &step, &actor, &requester, chrono::Utc::now()).await
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// POST /api/v1/requests
pub async fn submit_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let template = FormTemplateRepo::find_by_id(&state.pool, input.form_template_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "FormTemplate",
            id: input.form_template_id,
        }))?;
    if !template.is_active {
        return Err(AppError::Core(CoreError::Conflict(
            "This form is no longer accepting submissions".into(),
        )));
    }

    let requester = approvals::load_user(&state.pool, auth.user_id).await?;
    ensure_active(&requester)?;
    if !forms::role_may_submit(&template.allowed_roles, &requester.role) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Role '{}' may not submit this form",
            requester.role
        ))));
    }

    let fields = forms::parse_schema(&template.fields)?;
    forms::validate_submission(&fields, &input.form_data)?;

    let steps = WorkflowRepo::list_steps(&state.pool, template.workflow_id).await?;
    let first_step = steps.first().map(|s| s.step_number).ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "The form's workflow has no approval steps".into(),
        ))
    })?;

    let audit = NewAuditLog {
        action_type: action_types::REQUEST_SUBMIT,
        entity_type: entity_types::REQUEST,
        entity_id: None,
        actor_id: Some(auth.user_id),
        details: json!({
            "form_template_id": template.id,
            "template_code": template.code,
            "title": input.title.trim(),
        }),
    };
    let request = RequestRepo::create(
        &state.pool,
        &NewRequest {
            requester_id: auth.user_id,
            form_template_id: template.id,
            template_code: &template.code,
            workflow_id: template.workflow_id,
            first_step,
            title: &input.title,
            form_data: &input.form_data,
        },
        audit,
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "The form's workflow is not active".into(),
        ))
    })?;

    tracing::info!(
        user_id = auth.user_id,
        request_id = request.id,
        reference = %request.reference_number,
        "Request submitted"
    );

    state.event_bus.publish(
        PlatformEvent::request(event_types::REQUEST_SUBMITTED, snapshot(&request, None)?)
            .with_actor(auth.user_id),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// GET /api/v1/requests/mine
pub async fn list_my_requests(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<RequestListQuery>,
) -> AppResult<impl IntoResponse> {
    let status = params
        .status
        .as_deref()
        .map(RequestStatus::parse)
        .transpose()?;
    let paging = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let requests = RequestRepo::list_for_requester(
        &state.pool,
        auth.user_id,
        status.as_ref().map(RequestStatus::as_str),
        paging.limit(),
        paging.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/requests/inbox
///
/// Requests the caller may decide right now, directly or through an active
/// delegation, oldest step entry first. Paging applies after the authority
/// check, so every page holds only decidable requests.
pub async fn inbox(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(paging): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let caller = approvals::load_user(&state.pool, auth.user_id).await?;
    if !caller.is_active {
        return Ok(Json(DataResponse {
            data: Vec::<InboxItem>::new(),
        }));
    }

    let now = chrono::Utc::now();
    let grantors = approvals::active_grantors(&state.pool, caller.id, now).await?;

    let mut user_ids = vec![caller.id];
    user_ids.extend(grantors.iter().map(|g| g.id));
    let roles: Vec<String> = std::iter::once(&caller)
        .chain(grantors.iter())
        .map(|u| u.role.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let candidates =
        RequestRepo::list_inbox_candidates(&state.pool, caller.id, &user_ids, &roles).await?;
    if candidates.is_empty() {
        return Ok(Json(DataResponse {
            data: Vec::<InboxItem>::new(),
        }));
    }

    let requester_ids: Vec<DbId> = candidates
        .iter()
        .map(|c| c.request.requester_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let requesters: HashMap<DbId, User> = UserRepo::find_many(&state.pool, &requester_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let caller_member = caller.to_org_member();
    let grantor_members: Vec<_> = grantors.iter().map(User::to_org_member).collect();
    let mut steps_by_workflow: HashMap<DbId, Vec<WorkflowStep>> = HashMap::new();
    let mut items = Vec::new();

    for candidate in candidates {
        let Some(requester) = requesters.get(&candidate.request.requester_id) else {
            continue;
        };
        let workflow_id = candidate.request.workflow_id;
        if !steps_by_workflow.contains_key(&workflow_id) {
            let steps = WorkflowRepo::list_steps(&state.pool, workflow_id).await?;
            steps_by_workflow.insert(workflow_id, steps);
        }
        let Some(step) = steps_by_workflow
            .get(&workflow_id)
            .and_then(|steps| approvals::find_step(steps, candidate.request.current_step))
        else {
            continue;
        };

        let Ok(acting_as) = authority::resolve(
            &step.approver(),
            &caller_member,
            &requester.to_org_member(),
            &grantor_members,
        ) else {
            continue;
        };

        let sla = sla::current_state(candidate.step_entered_at, candidate.sla_hours, now);
        items.push(InboxItem {
            request: candidate,
            acting_as,
            sla,
        });
    }

    let page: Vec<InboxItem> = items
        .into_iter()
        .skip(paging.offset() as usize)
        .take(paging.limit() as usize)
        .collect();
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/requests/overdue
pub async fn list_overdue(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let now = chrono::Utc::now();
    let overdue =
        RequestRepo::list_overdue(&state.pool, now, params.limit(), params.offset()).await?;
    let items: Vec<OverdueItem> = overdue
        .into_iter()
        .map(|request| {
            let sla = sla::current_state(request.step_entered_at, request.sla_hours, now);
            OverdueItem { request, sla }
        })
        .collect();
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

/// GET /api/v1/requests/{id}
pub async fn get_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state, id).await?;
    let actions = RequestActionRepo::list_for_request(&state.pool, id).await?;
    ensure_participant(&state, &auth, &request, &actions).await?;

    let status = request.status()?;
    let steps = WorkflowRepo::list_steps(&state.pool, request.workflow_id).await?;
    let attachments = AttachmentRepo::list_for_request(&state.pool, id).await?;

    let points = actions
        .iter()
        .map(RequestAction::to_action_point)
        .collect::<Result<Vec<_>, _>>()?;

    let last_action = points.iter().max_by_key(|p| p.acted_at).map(|p| p.action);
    if !status_matches_last_action(status, last_action) {
        tracing::warn!(
            request_id = id,
            status = %status,
            last_action = ?last_action,
            "Request status disagrees with its last action"
        );
    }

    let history = sla::evaluate_history(request.submitted_at, &points, |n| {
        approvals::find_step(&steps, n).map(|s| s.sla_hours)
    });
    let current = match approvals::find_step(&steps, request.current_step) {
        Some(step) if status.is_actionable() => Some(sla::current_state(
            sla::step_entered_at(request.submitted_at, &points),
            step.sla_hours,
            chrono::Utc::now(),
        )),
        _ => None,
    };

    Ok(Json(DataResponse {
        data: RequestDetail {
            request,
            steps,
            actions,
            attachments,
            sla: RequestSla { current, history },
        },
    }))
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// POST /api/v1/requests/{id}/actions
///
/// Record an approver decision. The request row is updated only if nobody
/// else moved it in the meantime.
pub async fn act_on_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ActOnRequest>,
) -> AppResult<impl IntoResponse> {
    let action = ActionKind::parse_decision(&input.action)?;
    let comment = workflow_engine::normalize_comment(action, input.comment.as_deref())?;

    let request = find_request(&state, id).await?;
    let (step, steps) = approvals::current_step(&state.pool, &request).await?;
    let transition = workflow_engine::decide(request.status()?, step.position_in(&steps), action)?;

    let actor = approvals::load_user(&state.pool, auth.user_id).await?;
    let requester = approvals::load_user(&state.pool, request.requester_id).await?;
    let now = chrono::Utc::now();
    let authority =
        approvals::resolve_authority(&state.pool, &step, &actor, &requester, now).await?;

    let audit = NewAuditLog {
        action_type: action_types::REQUEST_ACTION,
        entity_type: entity_types::REQUEST,
        entity_id: Some(id),
        actor_id: Some(auth.user_id),
        details: transition_details(
            &transition,
            json!({
                "on_behalf_of": authority.on_behalf_of(),
                "comment": comment,
            }),
        ),
    };
    let (updated, recorded) = RequestRepo::apply_transition(
        &state.pool,
        id,
        &transition,
        &NewAction {
            actor_id: auth.user_id,
            on_behalf_of: authority.on_behalf_of(),
            action,
            comment: comment.as_deref(),
            acted_at: now,
        },
        None,
        audit,
    )
    .await?
    .ok_or_else(stale_request)?;

    tracing::info!(
        user_id = auth.user_id,
        request_id = id,
        action = %action,
        on_behalf_of = ?authority.on_behalf_of(),
        from_step = transition.from_step,
        to_status = %transition.to_status,
        "Request action recorded"
    );

    state.event_bus.publish(
        PlatformEvent::request(
            decision_event(transition.to_status),
            snapshot(&updated, comment)?,
        )
        .with_actor(auth.user_id),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ActionOutcome {
                request: updated,
                action: recorded,
            },
        }),
    ))
}

/// POST /api/v1/requests/{id}/resubmit
///
/// The requester sends a returned request back with corrected data; it
/// resumes at the step that returned it.
pub async fn resubmit_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ResubmitRequest>,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state, id).await?;
    if request.requester_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the requester can resubmit a request".into(),
        )));
    }
    let requester = approvals::load_user(&state.pool, auth.user_id).await?;
    ensure_active(&requester)?;

    let template = FormTemplateRepo::find_by_id(&state.pool, request.form_template_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "FormTemplate",
            id: request.form_template_id,
        }))?;
    let fields = forms::parse_schema(&template.fields)?;
    forms::validate_submission(&fields, &input.form_data)?;

    let steps = WorkflowRepo::list_steps(&state.pool, request.workflow_id).await?;
    let first_step = steps
        .first()
        .map(|s| s.step_number)
        .unwrap_or(request.current_step);
    let transition =
        workflow_engine::resubmit(request.status()?, request.current_step, first_step)?;

    let audit = NewAuditLog {
        action_type: action_types::REQUEST_RESUBMIT,
        entity_type: entity_types::REQUEST,
        entity_id: Some(id),
        actor_id: Some(auth.user_id),
        details: transition_details(&transition, json!({})),
    };
    let (updated, recorded) = RequestRepo::apply_transition(
        &state.pool,
        id,
        &transition,
        &NewAction {
            actor_id: auth.user_id,
            on_behalf_of: None,
            action: ActionKind::Resubmit,
            comment: None,
            acted_at: chrono::Utc::now(),
        },
        Some(&input.form_data),
        audit,
    )
    .await?
    .ok_or_else(stale_request)?;

    tracing::info!(
        user_id = auth.user_id,
        request_id = id,
        step = transition.to_step,
        "Request resubmitted"
    );

    state.event_bus.publish(
        PlatformEvent::request(event_types::REQUEST_RESUBMITTED, snapshot(&updated, None)?)
            .with_actor(auth.user_id),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ActionOutcome {
                request: updated,
                action: recorded,
            },
        }),
    ))
}
