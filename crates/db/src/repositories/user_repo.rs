//! Existence checks against the `users` table.

use propel_core::types::EntityId;
use sqlx::PgExecutor;

pub struct UserRepo;

impl UserRepo {
    pub async fn exists(executor: impl PgExecutor<'_>, id: EntityId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }
}
