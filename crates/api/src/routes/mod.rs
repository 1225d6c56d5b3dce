pub mod admin;
pub mod delegations;
pub mod forms;
pub mod health;
pub mod notifications;
pub mod requests;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /forms                 form templates open for submission
/// /requests              submission, inbox, detail, actions, attachments
/// /delegations           delegation requests and revocation
/// /notifications         the caller's in-app inbox
/// /admin                 users, organisation, workflows, forms,
///                        delegation review, audit log, SLA report
/// ```
///
/// `/health` is mounted at the root by the app router; uploaded files are
/// served from `/uploads`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/forms", forms::router())
        .nest("/requests", requests::router())
        .nest("/delegations", delegations::router())
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
}
