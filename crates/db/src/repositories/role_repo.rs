//! Repository for the `roles` table.

use sqlx::PgExecutor;

use crate::models::role::RoleRow;

/// Provides read operations for roles.
pub struct RoleRepo;

impl RoleRepo {
    /// Find a role by name (case-sensitive).
    pub async fn find_by_name(
        executor: impl PgExecutor<'_>,
        name: &str,
    ) -> Result<Option<RoleRow>, sqlx::Error> {
        sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(executor)
            .await
    }
}
