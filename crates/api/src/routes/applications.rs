//! Route definitions for the `/applications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::applications;
use crate::state::AppState;

/// Routes mounted at `/applications`.
///
/// ```text
/// POST   /                 -> submit
/// GET    /{id}             -> get_by_id
/// PUT    /{id}             -> update
/// DELETE /{id}             -> delete
/// POST   /{id}/approve     -> approve
/// POST   /{id}/reject      -> reject
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(applications::submit))
        .route(
            "/{id}",
            get(applications::get_by_id)
                .put(applications::update)
                .delete(applications::delete),
        )
        .route("/{id}/approve", post(applications::approve))
        .route("/{id}/reject", post(applications::reject))
}
