//! Route definitions for file resources.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::resources;
use crate::state::AppState;

/// Resource routes, merged at the `/api/v1` root.
///
/// ```text
/// GET    /resources/{model_target}/{target_id}    -> list
/// POST   /resources/{model_target}/{target_id}    -> upload
/// PUT    /resource-links/{link_id}                -> replace
/// DELETE /resource-links/{link_id}                -> soft_delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/resources/{model_target}/{target_id}",
            get(resources::list).post(resources::upload),
        )
        .route(
            "/resource-links/{link_id}",
            put(resources::replace).delete(resources::soft_delete),
        )
}
