//! Project type catalog rows.

use propel_core::entities::{ProjectType, RoleConstraint};
use propel_core::types::DbId;
use sqlx::FromRow;

/// A row from the `project_types` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectTypeRow {
    pub id: DbId,
    pub name: String,
    pub min_estimated_months: Option<i32>,
    pub max_estimated_months: Option<i32>,
    pub required_hours: i32,
}

/// A `project_type_roles` row joined with the role name.
#[derive(Debug, Clone, FromRow)]
pub struct RoleConstraintRow {
    pub role_id: DbId,
    pub role_name: String,
    pub min_count: i32,
    pub max_count: Option<i32>,
}

impl From<RoleConstraintRow> for RoleConstraint {
    fn from(row: RoleConstraintRow) -> Self {
        RoleConstraint {
            role_id: row.role_id,
            role_name: row.role_name,
            min_count: row.min_count,
            max_count: row.max_count,
        }
    }
}

impl ProjectTypeRow {
    pub fn with_constraints(self, constraints: Vec<RoleConstraintRow>) -> ProjectType {
        ProjectType {
            id: self.id,
            name: self.name,
            min_estimated_months: self.min_estimated_months,
            max_estimated_months: self.max_estimated_months,
            required_hours: self.required_hours,
            constraints: constraints.into_iter().map(Into::into).collect(),
        }
    }
}
