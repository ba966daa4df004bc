//! `GET /health`, mounted outside `/api/v1`.
//!
//! Always answers 200; `status` is `degraded` when Postgres or the upload
//! directory is unavailable.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// The storage root exists and is a directory.
    pub storage_healthy: bool,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = propel_db::health_check(&state.pool).await.is_ok();
    let storage_healthy = tokio::fs::metadata(&state.config.storage_root)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);

    Json(HealthResponse {
        status: if db_healthy && storage_healthy {
            "ok"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        storage_healthy,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
