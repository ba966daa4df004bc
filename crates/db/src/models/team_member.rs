//! Team member row model.

use propel_core::entities::TeamMember;
use propel_core::types::{DbId, EntityId, Timestamp};
use sqlx::FromRow;

/// A row from the `team_members` table.
#[derive(Debug, Clone, FromRow)]
pub struct TeamMemberRow {
    pub project_id: EntityId,
    pub user_id: EntityId,
    pub role_id: DbId,
    pub created_at: Timestamp,
}

impl From<TeamMemberRow> for TeamMember {
    fn from(row: TeamMemberRow) -> Self {
        TeamMember {
            project_id: row.project_id,
            user_id: row.user_id,
            role_id: row.role_id,
            created_at: row.created_at,
        }
    }
}
