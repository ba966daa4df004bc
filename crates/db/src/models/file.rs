//! File and file link row models.

use propel_core::resource::{Cardinality, FileLink, FilePurpose, FileRecord, ModelTarget, Resource};
use propel_core::store::StoreError;
use propel_core::types::{EntityId, Timestamp};
use sqlx::FromRow;

use crate::error::decode_error;

/// A row from the `files` table.
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub id: EntityId,
    pub stored_path: String,
    pub stored_name: String,
    pub original_name: String,
    pub mimetype: String,
    pub file_size: i64,
    pub file_kind: String,
    pub author_id: EntityId,
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<FileRow> for FileRecord {
    fn from(row: FileRow) -> Self {
        FileRecord {
            id: row.id,
            stored_path: row.stored_path,
            stored_name: row.stored_name,
            original_name: row.original_name,
            mimetype: row.mimetype,
            file_size: row.file_size,
            file_kind: row.file_kind,
            author_id: row.author_id,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `file_links` table.
#[derive(Debug, Clone, FromRow)]
pub struct FileLinkRow {
    pub id: EntityId,
    pub file_id: EntityId,
    pub model_target: String,
    pub uuid_target: EntityId,
    pub purpose: String,
    pub cardinality: String,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl TryFrom<FileLinkRow> for FileLink {
    type Error = StoreError;

    fn try_from(row: FileLinkRow) -> Result<Self, Self::Error> {
        let model_target = ModelTarget::from_name(&row.model_target)
            .ok_or_else(|| decode_error("file_links.model_target", &row.model_target))?;
        let purpose = FilePurpose::from_name(&row.purpose)
            .ok_or_else(|| decode_error("file_links.purpose", &row.purpose))?;
        let cardinality = Cardinality::from_name(&row.cardinality)
            .ok_or_else(|| decode_error("file_links.cardinality", &row.cardinality))?;
        Ok(FileLink {
            id: row.id,
            file_id: row.file_id,
            model_target,
            uuid_target: row.uuid_target,
            purpose,
            cardinality,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
        })
    }
}

/// A live link joined with its file. File columns carry a `file_` prefix
/// where they would collide with link columns.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    #[sqlx(flatten)]
    pub link: FileLinkRow,
    pub stored_path: String,
    pub stored_name: String,
    pub original_name: String,
    pub mimetype: String,
    pub file_size: i64,
    pub file_kind: String,
    pub author_id: EntityId,
    pub is_default: bool,
    pub file_created_at: Timestamp,
    pub file_updated_at: Timestamp,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = StoreError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        let file = FileRecord {
            id: row.link.file_id,
            stored_path: row.stored_path,
            stored_name: row.stored_name,
            original_name: row.original_name,
            mimetype: row.mimetype,
            file_size: row.file_size,
            file_kind: row.file_kind,
            author_id: row.author_id,
            is_default: row.is_default,
            created_at: row.file_created_at,
            updated_at: row.file_updated_at,
        };
        Ok(Resource {
            link: row.link.try_into()?,
            file,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn link_row(purpose: &str) -> FileLinkRow {
        FileLinkRow {
            id: EntityId::new_v4(),
            file_id: EntityId::new_v4(),
            model_target: "project".into(),
            uuid_target: EntityId::new_v4(),
            purpose: purpose.into(),
            cardinality: "one".into(),
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn link_row_decodes_enum_columns() {
        let link = FileLink::try_from(link_row("cover")).unwrap();
        assert_eq!(link.model_target, ModelTarget::Project);
        assert_eq!(link.purpose, FilePurpose::Cover);
        assert_eq!(link.cardinality, Cardinality::One);
        assert!(link.is_live());
    }

    #[test]
    fn unknown_purpose_is_a_decode_failure() {
        let err = FileLink::try_from(link_row("banner")).unwrap_err();
        assert!(err.to_string().contains("file_links.purpose"));
    }
}
