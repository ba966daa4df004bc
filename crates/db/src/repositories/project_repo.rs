//! Repository for the `projects` table.

use propel_core::entities::NewProject;
use propel_core::types::EntityId;
use sqlx::PgExecutor;

use crate::models::project::ProjectRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, application_id, creator_id, status, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project in `project_approved`, returning the created row.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewProject,
    ) -> Result<ProjectRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (application_id, creator_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(input.application_id)
            .bind(input.creator_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: EntityId,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_application(
        executor: impl PgExecutor<'_>,
        application_id: EntityId,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE application_id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(application_id)
            .fetch_optional(executor)
            .await
    }

    /// Move `from` -> `to` only if the row is still in `from`.
    pub async fn transition_status(
        executor: impl PgExecutor<'_>,
        id: EntityId,
        from: &str,
        to: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete a project. Team rows go with it via `ON DELETE CASCADE`.
    pub async fn delete(executor: impl PgExecutor<'_>, id: EntityId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
