//! Handlers for `/projects/{project_id}/team`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use propel_core::entities::TeamMember;
use propel_core::types::EntityId;
use propel_core::validation::RawInput;

use super::with_path_id;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{project_id}/team
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(project_id): Path<EntityId>,
) -> AppResult<Json<DataResponse<Vec<TeamMember>>>> {
    let members = state.team.list(project_id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// POST /api/v1/projects/{project_id}/team
///
/// Body: `{ "user_id": "<uuid>", "role_id": <id> }`.
pub async fn add_member(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<EntityId>,
    Json(input): Json<RawInput>,
) -> AppResult<(StatusCode, Json<DataResponse<TeamMember>>)> {
    let input = with_path_id(input, "project_id", project_id);
    let member = state.team.add_member(user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: member })))
}

/// POST /api/v1/projects/{project_id}/team/batch
///
/// Body: `{ "members": [{ "user_id": "<uuid>", "role_id": <id> }, ...] }`.
/// Members already on the team are skipped; only new rows are returned.
pub async fn create_team(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<EntityId>,
    Json(input): Json<RawInput>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<TeamMember>>>)> {
    let input = with_path_id(input, "project_id", project_id);
    let created = state.team.create_team(user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// PUT /api/v1/projects/{project_id}/team/{user_id}
///
/// Body: `{ "role_id": <id> }`.
pub async fn change_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path((project_id, member_id)): Path<(EntityId, EntityId)>,
    Json(input): Json<RawInput>,
) -> AppResult<Json<DataResponse<TeamMember>>> {
    let member = state
        .team
        .change_role(project_id, member_id, user.user_id, &input)
        .await?;
    Ok(Json(DataResponse { data: member }))
}

/// DELETE /api/v1/projects/{project_id}/team/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthUser,
    Path((project_id, member_id)): Path<(EntityId, EntityId)>,
) -> AppResult<StatusCode> {
    state
        .team
        .remove_member(project_id, member_id, user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
