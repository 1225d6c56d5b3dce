//! Approver lookup shared by the request handlers and the notification
//! router.
//!
//! Authority is always decided from the stored user rows (role, department,
//! active flag), never from token claims.

use std::collections::BTreeSet;

use unicorr_core::authority::{self, Authority};
use unicorr_core::error::CoreError;
use unicorr_core::types::{DbId, Timestamp};
use unicorr_db::models::request::Request;
use unicorr_db::models::user::User;
use unicorr_db::models::workflow::WorkflowStep;
use unicorr_db::repositories::{DelegationRepo, UserRepo, WorkflowRepo};
use unicorr_db::DbPool;

use crate::error::{AppError, AppResult};

pub async fn load_user(pool: &DbPool, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))
}

/// The request's current step together with every step of its workflow.
pub async fn current_step(
    pool: &DbPool,
    request: &Request,
) -> AppResult<(WorkflowStep, Vec<WorkflowStep>)> {
    let steps = WorkflowRepo::list_steps(pool, request.workflow_id).await?;
    let step = find_step(&steps, request.current_step)
        .cloned()
        .ok_or_else(|| {
            AppError::Core(CoreError::Internal(format!(
                "Request {} points at missing step {} of workflow {}",
                request.id, request.current_step, request.workflow_id
            )))
        })?;
    Ok((step, steps))
}

pub fn find_step(steps: &[WorkflowStep], step_number: i32) -> Option<&WorkflowStep> {
    steps.iter().find(|s| s.step_number == step_number)
}

/// Users whose approved delegation to `grantee_id` covers `at`.
pub async fn active_grantors(
    pool: &DbPool,
    grantee_id: DbId,
    at: Timestamp,
) -> Result<Vec<User>, sqlx::Error> {
    let ids = DelegationRepo::active_grantors(pool, grantee_id, at).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    UserRepo::find_many(pool, &ids).await
}

/// Decide whether `actor` may act on `step` of `requester`'s request now.
pub async fn resolve_authority(
    pool: &DbPool,
    step: &WorkflowStep,
    actor: &User,
    requester: &User,
    now: Timestamp,
) -> AppResult<Authority> {
    let grantors: Vec<_> = active_grantors(pool, actor.id, now)
        .await?
        .iter()
        .map(User::to_org_member)
        .collect();
    let authority = authority::resolve(
        &step.approver(),
        &actor.to_org_member(),
        &requester.to_org_member(),
        &grantors,
    )?;
    Ok(authority)
}

/// Everyone who may decide `step` for `requester`: the direct approvers plus
/// the grantees currently standing in for them.
pub async fn step_deciders(
    pool: &DbPool,
    step: &WorkflowStep,
    requester: &User,
    now: Timestamp,
) -> Result<Vec<DbId>, sqlx::Error> {
    let requester_member = requester.to_org_member();
    let candidates = match (step.approver_user_id, step.approver_role.as_deref()) {
        (Some(user_id), _) => UserRepo::find_by_id(pool, user_id)
            .await?
            .into_iter()
            .collect(),
        (None, Some(role)) => UserRepo::list_active_by_role(pool, role).await?,
        (None, None) => Vec::new(),
    };

    let approver = step.approver();
    let direct: Vec<DbId> = candidates
        .iter()
        .filter(|u| u.id != requester.id)
        .filter(|u| authority::is_step_approver(&approver, &u.to_org_member(), &requester_member))
        .map(|u| u.id)
        .collect();

    let mut deciders: BTreeSet<DbId> = direct.iter().copied().collect();
    if !direct.is_empty() {
        deciders.extend(DelegationRepo::active_grantees(pool, &direct, now).await?);
    }
    deciders.remove(&requester.id);
    Ok(deciders.into_iter().collect())
}
