//! Handlers for project lifecycle transitions.

use axum::extract::{Path, State};
use axum::Json;
use propel_core::entities::{Application, Project};
use propel_core::lifecycle::RollbackOutcome;
use propel_core::types::EntityId;
use propel_core::validation::RawInput;
use serde_json::Value;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<EntityId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state.lifecycle.get_project(id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/start
pub async fn start(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<EntityId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state.lifecycle.start(id, user.user_id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/rollback
pub async fn rollback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<EntityId>,
) -> AppResult<Json<DataResponse<RollbackOutcome>>> {
    let outcome = state.lifecycle.rollback(id, user.user_id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// PUT /api/v1/projects/{id}/deadline
///
/// Body: `{ "deadline": "YYYY-MM-DD" }`.
pub async fn update_deadline(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<EntityId>,
    Json(input): Json<RawInput>,
) -> AppResult<Json<DataResponse<Application>>> {
    let raw_deadline = input.get("deadline").cloned().unwrap_or(Value::Null);
    let application = state
        .lifecycle
        .update_deadline(id, &raw_deadline, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: application }))
}
