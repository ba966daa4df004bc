//! Handlers for the `/applications` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use propel_core::entities::Application;
use propel_core::lifecycle::ApprovalOutcome;
use propel_core::types::EntityId;
use propel_core::validation::{validate_approval, RawInput};

use super::with_path_id;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireReviewer;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/applications
pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<RawInput>,
) -> AppResult<(StatusCode, Json<DataResponse<Application>>)> {
    let application = state.applications.submit(user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: application })))
}

/// GET /api/v1/applications/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<EntityId>,
) -> AppResult<Json<DataResponse<Application>>> {
    let application = state.applications.get(id).await?;
    Ok(Json(DataResponse { data: application }))
}

/// PUT /api/v1/applications/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<EntityId>,
    Json(input): Json<RawInput>,
) -> AppResult<Json<DataResponse<Application>>> {
    let application = state.applications.update(id, user.user_id, &input).await?;
    Ok(Json(DataResponse { data: application }))
}

/// DELETE /api/v1/applications/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<EntityId>,
) -> AppResult<StatusCode> {
    state.applications.delete(id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/applications/{id}/approve
///
/// Body: `{ "project_type_id": <id>, "advisor_user_id": "<uuid>" }`.
pub async fn approve(
    State(state): State<AppState>,
    RequireReviewer(reviewer): RequireReviewer,
    Path(id): Path<EntityId>,
    Json(input): Json<RawInput>,
) -> AppResult<(StatusCode, Json<DataResponse<ApprovalOutcome>>)> {
    let request = validate_approval(&with_path_id(input, "application_id", id))?;
    let outcome = state.lifecycle.approve(&request, reviewer.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

/// POST /api/v1/applications/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    RequireReviewer(reviewer): RequireReviewer,
    Path(id): Path<EntityId>,
) -> AppResult<Json<DataResponse<Application>>> {
    let application = state.applications.reject(id, reviewer.user_id).await?;
    Ok(Json(DataResponse { data: application }))
}
