//! Repository for the `team_members` table.

use propel_core::entities::NewTeamMember;
use propel_core::types::{DbId, EntityId};
use sqlx::PgExecutor;

use crate::models::team_member::TeamMemberRow;

const COLUMNS: &str = "project_id, user_id, role_id, created_at";

/// Provides CRUD operations for team members.
pub struct TeamMemberRepo;

impl TeamMemberRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewTeamMember,
    ) -> Result<TeamMemberRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO team_members (project_id, user_id, role_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TeamMemberRow>(&query)
            .bind(input.project_id)
            .bind(input.user_id)
            .bind(input.role_id)
            .fetch_one(executor)
            .await
    }

    /// Bulk insert. Pairs that already exist are skipped; only inserted rows
    /// are returned.
    pub async fn create_many_skip_duplicates(
        executor: impl PgExecutor<'_>,
        inputs: &[NewTeamMember],
    ) -> Result<Vec<TeamMemberRow>, sqlx::Error> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let project_ids: Vec<EntityId> = inputs.iter().map(|m| m.project_id).collect();
        let user_ids: Vec<EntityId> = inputs.iter().map(|m| m.user_id).collect();
        let role_ids: Vec<DbId> = inputs.iter().map(|m| m.role_id).collect();

        let query = format!(
            "INSERT INTO team_members (project_id, user_id, role_id)
             SELECT * FROM UNNEST($1::UUID[], $2::UUID[], $3::BIGINT[])
             ON CONFLICT (project_id, user_id) DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TeamMemberRow>(&query)
            .bind(&project_ids)
            .bind(&user_ids)
            .bind(&role_ids)
            .fetch_all(executor)
            .await
    }

    /// List a project's members, oldest first.
    pub async fn list_by_project(
        executor: impl PgExecutor<'_>,
        project_id: EntityId,
    ) -> Result<Vec<TeamMemberRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM team_members WHERE project_id = $1 ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, TeamMemberRow>(&query)
            .bind(project_id)
            .fetch_all(executor)
            .await
    }

    pub async fn find(
        executor: impl PgExecutor<'_>,
        project_id: EntityId,
        user_id: EntityId,
    ) -> Result<Option<TeamMemberRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM team_members WHERE project_id = $1 AND user_id = $2");
        sqlx::query_as::<_, TeamMemberRow>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn update_role(
        executor: impl PgExecutor<'_>,
        project_id: EntityId,
        user_id: EntityId,
        role_id: DbId,
    ) -> Result<Option<TeamMemberRow>, sqlx::Error> {
        let query = format!(
            "UPDATE team_members SET role_id = $3
             WHERE project_id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TeamMemberRow>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(role_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn delete(
        executor: impl PgExecutor<'_>,
        project_id: EntityId,
        user_id: EntityId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM team_members WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every member of a project. Returns the number of rows removed.
    pub async fn delete_by_project(
        executor: impl PgExecutor<'_>,
        project_id: EntityId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM team_members WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
