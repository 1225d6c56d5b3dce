//! Routes mounted at `/requests`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{attachments, requests};
use crate::state::AppState;

/// ```text
/// POST   /                      -> submit_request
/// GET    /mine                  -> list_my_requests (?status, limit, offset)
/// GET    /inbox                 -> inbox (?limit, offset)
/// GET    /overdue               -> list_overdue (admin)
/// GET    /{id}                  -> get_request
/// POST   /{id}/actions          -> act_on_request
/// POST   /{id}/resubmit         -> resubmit_request
/// GET    /{id}/attachments      -> list_attachments
/// POST   /{id}/attachments      -> upload_attachment (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(requests::submit_request))
        .route("/mine", get(requests::list_my_requests))
        .route("/inbox", get(requests::inbox))
        .route("/overdue", get(requests::list_overdue))
        .route("/{id}", get(requests::get_request))
        .route("/{id}/actions", post(requests::act_on_request))
        .route("/{id}/resubmit", post(requests::resubmit_request))
        .route(
            "/{id}/attachments",
            get(attachments::list_attachments).post(attachments::upload_attachment),
        )
}
