//! Routes mounted at `/delegations`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::delegations;
use crate::state::AppState;

/// ```text
/// POST   /               -> create_delegation
/// GET    /mine           -> list_my_delegations
/// POST   /{id}/revoke    -> revoke_delegation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(delegations::create_delegation))
        .route("/mine", get(delegations::list_my_delegations))
        .route("/{id}/revoke", post(delegations::revoke_delegation))
}
