pub mod applications;
pub mod health;
pub mod projects;
pub mod resources;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /applications                                    submit
/// /applications/{id}                               get, update, delete
/// /applications/{id}/approve                       approve (reviewer)
/// /applications/{id}/reject                        reject (reviewer)
///
/// /projects/{id}                                   get
/// /projects/{id}/start                             start
/// /projects/{id}/rollback                          rollback
/// /projects/{id}/deadline                          update deadline (PUT)
/// /projects/{id}/team                      list, add member
/// /projects/{id}/team/batch                create team
/// /projects/{id}/team/{user_id}            change role, remove
///
/// /resources/{model_target}/{target_id}            list, upload (multipart)
/// /resource-links/{link_id}                        replace (multipart), soft delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/applications", applications::router())
        .nest("/projects", projects::router())
        .merge(resources::router())
}
