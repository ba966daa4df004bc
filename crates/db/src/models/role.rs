//! Role entity model.

use propel_core::entities::Role;
use propel_core::types::DbId;
use sqlx::FromRow;

/// A row from the `roles` table.
#[derive(Debug, Clone, FromRow)]
pub struct RoleRow {
    pub id: DbId,
    pub name: String,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            name: row.name,
        }
    }
}
