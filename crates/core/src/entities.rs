//! Domain records exchanged with the persistence port.
//!
//! These are plain data; invariants are enforced by the validators in
//! [`crate::validation`] before anything reaches the store.

use serde::{Deserialize, Serialize};

use crate::deadline::DurationBounds;
use crate::status::{ApplicationStatus, ProjectStatus};
use crate::types::{Date, DbId, EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// A submitted proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
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
    pub status: ApplicationStatus,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Application {
    /// The project type, when exactly one is attached.
    pub fn single_project_type(&self) -> Option<DbId> {
        match self.project_type_ids.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }
}

/// Normalized application fields produced by the application validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationFields {
    pub title: String,
    pub short_description: String,
    pub long_description: String,
    pub deadline: Date,
    pub project_type_ids: Vec<DbId>,
    pub faculty_ids: Vec<DbId>,
    pub problem_type_ids: Vec<DbId>,
    pub custom_problem_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// An approved application under execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub application_id: EntityId,
    pub creator_id: EntityId,
    pub status: ProjectStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for a project row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub application_id: EntityId,
    pub creator_id: EntityId,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A team role from the role catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
}

/// Per-role quota under a project type. `max_count = None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConstraint {
    pub role_id: DbId,
    pub role_name: String,
    pub min_count: i32,
    pub max_count: Option<i32>,
}

/// Catalog entry describing a kind of project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectType {
    pub id: DbId,
    pub name: String,
    pub min_estimated_months: Option<i32>,
    pub max_estimated_months: Option<i32>,
    pub required_hours: i32,
    pub constraints: Vec<RoleConstraint>,
}

impl ProjectType {
    pub fn duration_bounds(&self) -> DurationBounds {
        DurationBounds {
            min_months: self.min_estimated_months,
            max_months: self.max_estimated_months,
        }
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A user's role assignment on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub project_id: EntityId,
    pub user_id: EntityId,
    pub role_id: DbId,
    pub created_at: Timestamp,
}

/// Insert payload for a team member row, produced by the team member validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewTeamMember {
    pub project_id: EntityId,
    pub user_id: EntityId,
    pub role_id: DbId,
}
