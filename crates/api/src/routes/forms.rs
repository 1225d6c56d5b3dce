//! Routes mounted at `/forms`.

use axum::routing::get;
use axum::Router;

use crate::handlers::forms;
use crate::state::AppState;

/// ```text
/// GET    /           -> list_forms
/// GET    /{id}       -> get_form
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(forms::list_forms))
        .route("/{id}", get(forms::get_form))
}
