//! Application row model.

use propel_core::entities::Application;
use propel_core::status::ApplicationStatus;
use propel_core::store::StoreError;
use propel_core::types::{Date, DbId, EntityId, Timestamp};
use sqlx::FromRow;

use crate::error::decode_error;

/// An `applications` row with its join-table ids aggregated into arrays.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: EntityId,
    pub author_id: EntityId,
    pub title: String,
    pub short_description: String,
    pub long_description: String,
    pub deadline: Date,
    pub project_type_ids: Vec<DbId>,
    pub faculty_ids: Vec<DbId>,
    pub problem_type_ids: Vec<DbId>,
    pub custom_problem_type: Option<String>,
    pub status: String,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = StoreError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let status = ApplicationStatus::from_name(&row.status)
            .map_err(|_| decode_error("applications.status", &row.status))?;
        Ok(Application {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            short_description: row.short_description,
            long_description: row.long_description,
            deadline: row.deadline,
            project_type_ids: row.project_type_ids,
            faculty_ids: row.faculty_ids,
            problem_type_ids: row.problem_type_ids,
            custom_problem_type: row.custom_problem_type,
            status,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
