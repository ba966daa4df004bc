//! Repository for the `applications` table and its join tables.

use propel_core::entities::ApplicationFields;
use propel_core::types::{Date, DbId, EntityId};
use sqlx::{PgConnection, PgExecutor};

use crate::models::application::ApplicationRow;

/// Column list shared across queries. Join-table ids are aggregated in place.
const COLUMNS: &str = "a.id, a.author_id, a.title, a.short_description, a.long_description, \
     a.deadline, \
     ARRAY(SELECT project_type_id FROM application_project_types \
           WHERE application_id = a.id ORDER BY project_type_id) AS project_type_ids, \
     ARRAY(SELECT faculty_id FROM application_faculties \
           WHERE application_id = a.id ORDER BY faculty_id) AS faculty_ids, \
     ARRAY(SELECT problem_type_id FROM application_problem_types \
           WHERE application_id = a.id ORDER BY problem_type_id) AS problem_type_ids, \
     a.custom_problem_type, a.status, a.deleted_at, a.created_at, a.updated_at";

/// `(table, id column)` pairs for the many-to-many selections.
const PROJECT_TYPES: (&str, &str) = ("application_project_types", "project_type_id");
const FACULTIES: (&str, &str) = ("application_faculties", "faculty_id");
const PROBLEM_TYPES: (&str, &str) = ("application_problem_types", "problem_type_id");

/// Provides CRUD operations for applications.
pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Find an application by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: EntityId,
    ) -> Result<Option<ApplicationRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications a WHERE a.id = $1 AND a.deleted_at IS NULL"
        );
        sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Insert an application in review together with its selections.
    pub async fn create(
        conn: &mut PgConnection,
        author_id: EntityId,
        input: &ApplicationFields,
    ) -> Result<ApplicationRow, sqlx::Error> {
        let id: EntityId = sqlx::query_scalar(
            "INSERT INTO applications
                (author_id, title, short_description, long_description, deadline, custom_problem_type)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(author_id)
        .bind(&input.title)
        .bind(&input.short_description)
        .bind(&input.long_description)
        .bind(input.deadline)
        .bind(&input.custom_problem_type)
        .fetch_one(&mut *conn)
        .await?;

        Self::replace_selections(conn, id, input).await?;
        Self::find_by_id(&mut *conn, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Overwrite the editable fields and selections.
    ///
    /// Returns `None` if no live row with the given `id` exists.
    pub async fn update(
        conn: &mut PgConnection,
        id: EntityId,
        input: &ApplicationFields,
    ) -> Result<Option<ApplicationRow>, sqlx::Error> {
        let updated: Option<EntityId> = sqlx::query_scalar(
            "UPDATE applications SET
                title = $2,
                short_description = $3,
                long_description = $4,
                deadline = $5,
                custom_problem_type = $6,
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING id",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.short_description)
        .bind(&input.long_description)
        .bind(input.deadline)
        .bind(&input.custom_problem_type)
        .fetch_optional(&mut *conn)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }
        Self::replace_selections(conn, id, input).await?;
        Self::find_by_id(&mut *conn, id).await
    }

    /// Returns `true` if a live row was updated.
    pub async fn set_status(
        executor: impl PgExecutor<'_>,
        id: EntityId,
        status: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applications SET status = $2, updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_deadline(
        executor: impl PgExecutor<'_>,
        id: EntityId,
        deadline: Date,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applications SET deadline = $2, updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(deadline)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the attached project types.
    pub async fn set_project_types(
        conn: &mut PgConnection,
        id: EntityId,
        project_type_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        Self::replace_join(conn, PROJECT_TYPES, id, project_type_ids).await
    }

    /// Soft-delete an application. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(
        executor: impl PgExecutor<'_>,
        id: EntityId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applications SET deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_selections(
        conn: &mut PgConnection,
        id: EntityId,
        input: &ApplicationFields,
    ) -> Result<(), sqlx::Error> {
        Self::replace_join(conn, PROJECT_TYPES, id, &input.project_type_ids).await?;
        Self::replace_join(conn, FACULTIES, id, &input.faculty_ids).await?;
        Self::replace_join(conn, PROBLEM_TYPES, id, &input.problem_type_ids).await
    }

    async fn replace_join(
        conn: &mut PgConnection,
        (table, column): (&str, &str),
        id: EntityId,
        ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let delete = format!("DELETE FROM {table} WHERE application_id = $1");
        sqlx::query(&delete).bind(id).execute(&mut *conn).await?;

        if ids.is_empty() {
            return Ok(());
        }
        let insert = format!(
            "INSERT INTO {table} (application_id, {column})
             SELECT $1, UNNEST($2::BIGINT[])
             ON CONFLICT DO NOTHING"
        );
        sqlx::query(&insert)
            .bind(id)
            .bind(ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
