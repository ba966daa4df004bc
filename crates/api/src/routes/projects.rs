//! Route definitions for the `/projects` resource.
//!
//! Also nests team routes under `/projects/{id}/team`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{projects, team};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /{id}                              -> get_by_id
/// POST   /{id}/start                        -> start
/// POST   /{id}/rollback                     -> rollback
/// PUT    /{id}/deadline                     -> update_deadline
///
/// GET    /{id}/team                 -> list
/// POST   /{id}/team                 -> add_member
/// POST   /{id}/team/batch           -> create_team
/// PUT    /{id}/team/{user_id}       -> change_role
/// DELETE /{id}/team/{user_id}       -> remove_member
/// ```
pub fn router() -> Router<AppState> {
    let team_routes = Router::new()
        .route("/", get(team::list).post(team::add_member))
        .route("/batch", post(team::create_team))
        .route(
            "/{user_id}",
            put(team::change_role).delete(team::remove_member),
        );

    Router::new()
        .route("/{id}", get(projects::get_by_id))
        .route("/{id}/start", post(projects::start))
        .route("/{id}/rollback", post(projects::rollback))
        .route("/{id}/deadline", put(projects::update_deadline))
        .nest("/{id}/team", team_routes)
}
