//! Repository for the `project_types` catalog.

use propel_core::entities::ProjectType;
use propel_core::types::DbId;
use sqlx::PgPool;

use crate::models::project_type::{ProjectTypeRow, RoleConstraintRow};

const COLUMNS: &str = "id, name, min_estimated_months, max_estimated_months, required_hours";

/// Provides read operations for project types.
pub struct ProjectTypeRepo;

impl ProjectTypeRepo {
    /// Find a project type with its per-role quotas.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM project_types WHERE id = $1");
        let Some(row) = sqlx::query_as::<_, ProjectTypeRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let constraints = sqlx::query_as::<_, RoleConstraintRow>(
            "SELECT ptr.role_id, r.name AS role_name, ptr.min_count, ptr.max_count
             FROM project_type_roles ptr
             JOIN roles r ON r.id = ptr.role_id
             WHERE ptr.project_type_id = $1
             ORDER BY ptr.role_id ASC",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(Some(row.with_constraints(constraints)))
    }
}
