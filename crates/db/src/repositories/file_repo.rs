//! Repository for the `files` table.

use propel_core::resource::NewFileRecord;
use propel_core::types::EntityId;
use sqlx::PgExecutor;

use crate::models::file::FileRow;

const COLUMNS: &str = "id, stored_path, stored_name, original_name, mimetype, file_size, \
     file_kind, author_id, is_default, created_at, updated_at";

/// Provides CRUD operations for stored file rows.
pub struct FileRepo;

impl FileRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewFileRecord,
    ) -> Result<FileRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO files
                (stored_path, stored_name, original_name, mimetype, file_size, file_kind,
                 author_id, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FileRow>(&query)
            .bind(&input.stored_path)
            .bind(&input.stored_name)
            .bind(&input.original_name)
            .bind(&input.mimetype)
            .bind(input.file_size)
            .bind(&input.file_kind)
            .bind(input.author_id)
            .bind(input.is_default)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: EntityId,
    ) -> Result<Option<FileRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM files WHERE id = $1");
        sqlx::query_as::<_, FileRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Point the row at new bytes, keeping its id and author.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn replace(
        executor: impl PgExecutor<'_>,
        id: EntityId,
        input: &NewFileRecord,
    ) -> Result<Option<FileRow>, sqlx::Error> {
        let query = format!(
            "UPDATE files SET
                stored_path = $2,
                stored_name = $3,
                original_name = $4,
                mimetype = $5,
                file_size = $6,
                file_kind = $7,
                is_default = $8,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FileRow>(&query)
            .bind(id)
            .bind(&input.stored_path)
            .bind(&input.stored_name)
            .bind(&input.original_name)
            .bind(&input.mimetype)
            .bind(input.file_size)
            .bind(&input.file_kind)
            .bind(input.is_default)
            .fetch_optional(executor)
            .await
    }
}
