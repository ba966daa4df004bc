//! Project row model.

use propel_core::entities::Project;
use propel_core::status::ProjectStatus;
use propel_core::store::StoreError;
use propel_core::types::{EntityId, Timestamp};
use sqlx::FromRow;

use crate::error::decode_error;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: EntityId,
    pub application_id: EntityId,
    pub creator_id: EntityId,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status = ProjectStatus::from_name(&row.status)
            .map_err(|_| decode_error("projects.status", &row.status))?;
        Ok(Project {
            id: row.id,
            application_id: row.application_id,
            creator_id: row.creator_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
