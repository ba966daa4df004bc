//! Repository for the `file_links` table.

use propel_core::resource::NewFileLink;
use propel_core::types::EntityId;
use sqlx::PgExecutor;

use crate::models::file::{FileLinkRow, ResourceRow};

const COLUMNS: &str =
    "id, file_id, model_target, uuid_target, purpose, cardinality, deleted_at, created_at";

/// Provides operations for links between files and owning entities.
pub struct FileLinkRepo;

impl FileLinkRepo {
    /// Insert a live link. The partial unique indexes `uq_file_links_single`
    /// and `uq_file_links_multi` enforce cardinality.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewFileLink,
    ) -> Result<FileLinkRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO file_links (file_id, model_target, uuid_target, purpose, cardinality)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FileLinkRow>(&query)
            .bind(input.file_id)
            .bind(input.model_target.as_str())
            .bind(input.uuid_target)
            .bind(input.purpose.as_str())
            .bind(input.cardinality.as_str())
            .fetch_one(executor)
            .await
    }

    /// Find a link by ID, including soft-deleted rows.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: EntityId,
    ) -> Result<Option<FileLinkRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM file_links WHERE id = $1");
        sqlx::query_as::<_, FileLinkRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Live links for a target joined with their files, oldest first.
    pub async fn list_resources(
        executor: impl PgExecutor<'_>,
        model_target: &str,
        uuid_target: EntityId,
    ) -> Result<Vec<ResourceRow>, sqlx::Error> {
        sqlx::query_as::<_, ResourceRow>(
            "SELECT l.id, l.file_id, l.model_target, l.uuid_target, l.purpose, l.cardinality,
                    l.deleted_at, l.created_at,
                    f.stored_path, f.stored_name, f.original_name, f.mimetype, f.file_size,
                    f.file_kind, f.author_id, f.is_default,
                    f.created_at AS file_created_at, f.updated_at AS file_updated_at
             FROM file_links l
             JOIN files f ON f.id = l.file_id
             WHERE l.model_target = $1 AND l.uuid_target = $2 AND l.deleted_at IS NULL
             ORDER BY l.created_at ASC",
        )
        .bind(model_target)
        .bind(uuid_target)
        .fetch_all(executor)
        .await
    }

    /// Soft-delete a live link. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(
        executor: impl PgExecutor<'_>,
        id: EntityId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE file_links SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
