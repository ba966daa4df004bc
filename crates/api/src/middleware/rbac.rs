//! Role-based access control (RBAC) extractors.
//!
//! Platform roles come from the token, not from project team membership.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use propel_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_REVIEWER: &str = "reviewer";

/// Requires `reviewer` or `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn review(RequireReviewer(user): RequireReviewer) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireReviewer(pub AuthUser);

impl FromRequestParts<AppState> for RequireReviewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN && user.role != ROLE_REVIEWER {
            return Err(AppError::Core(CoreError::Authorization(
                "Reviewer or Admin role required".into(),
            )));
        }
        Ok(RequireReviewer(user))
    }
}
