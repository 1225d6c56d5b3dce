//! Routes mounted at `/admin`. Every handler requires the admin role.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{audit, delegations, forms, organisation, reports, users, workflows};
use crate::state::AppState;

/// ```text
/// GET, POST      /users                     -> list_users, create_user
/// PUT, DELETE    /users/{id}                -> update_user, deactivate_user
///
/// GET            /roles                     -> list_roles
/// GET, POST      /colleges                  -> list_colleges, create_college
/// GET, POST      /departments               -> list_departments, create_department
///
/// GET, POST      /workflows                 -> list_workflows, create_workflow
/// GET, PUT       /workflows/{id}            -> get_workflow, update_workflow
/// PUT            /workflows/{id}/steps      -> replace_steps
///
/// POST           /forms                     -> create_form
/// PUT            /forms/{id}                -> update_form
///
/// GET            /delegations               -> list_delegations (?status, limit, offset)
/// POST           /delegations/{id}/approve  -> approve_delegation
/// POST           /delegations/{id}/reject   -> reject_delegation
///
/// GET            /audit-logs                -> query_audit_logs
/// GET            /audit-logs/verify         -> verify_audit_chain
///
/// GET            /reports/sla               -> sla_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            put(users::update_user).delete(users::deactivate_user),
        )
        .route("/roles", get(organisation::list_roles))
        .route(
            "/colleges",
            get(organisation::list_colleges).post(organisation::create_college),
        )
        .route(
            "/departments",
            get(organisation::list_departments).post(organisation::create_department),
        )
        .route(
            "/workflows",
            get(workflows::list_workflows).post(workflows::create_workflow),
        )
        .route(
            "/workflows/{id}",
            get(workflows::get_workflow).put(workflows::update_workflow),
        )
        .route("/workflows/{id}/steps", put(workflows::replace_steps))
        .route("/forms", post(forms::create_form))
        .route("/forms/{id}", put(forms::update_form))
        .route("/delegations", get(delegations::list_delegations))
        .route(
            "/delegations/{id}/approve",
            post(delegations::approve_delegation),
        )
        .route(
            "/delegations/{id}/reject",
            post(delegations::reject_delegation),
        )
        .route("/audit-logs", get(audit::query_audit_logs))
        .route("/audit-logs/verify", get(audit::verify_audit_chain))
        .route("/reports/sla", get(reports::sla_report))
}
