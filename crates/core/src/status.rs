//! Lifecycle status enums for applications and projects.
//!
//! The string values are the ones persisted in the `status` columns.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, FieldViolation};

pub const APPLICATION_IN_REVIEW: &str = "in_review";
pub const APPLICATION_APPROVED: &str = "approved";
pub const APPLICATION_REJECTED: &str = "rejected";

pub const PROJECT_APPROVED: &str = "project_approved";
pub const PROJECT_IN_PROGRESS: &str = "project_in_progress";

/// Review status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    InReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InReview => APPLICATION_IN_REVIEW,
            Self::Approved => APPLICATION_APPROVED,
            Self::Rejected => APPLICATION_REJECTED,
        }
    }

    /// Parse from the database `status` column.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            APPLICATION_IN_REVIEW => Ok(Self::InReview),
            APPLICATION_APPROVED => Ok(Self::Approved),
            APPLICATION_REJECTED => Ok(Self::Rejected),
            _ => Err(CoreError::validation(vec![FieldViolation::new(
                "status",
                "invalid_value",
            )])),
        }
    }

    /// Whether the author may still edit the application.
    pub fn is_editable(self) -> bool {
        matches!(self, Self::InReview | Self::Rejected)
    }
}

/// Execution status of a project. A project with no row is "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    ProjectApproved,
    ProjectInProgress,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProjectApproved => PROJECT_APPROVED,
            Self::ProjectInProgress => PROJECT_IN_PROGRESS,
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            PROJECT_APPROVED => Ok(Self::ProjectApproved),
            PROJECT_IN_PROGRESS => Ok(Self::ProjectInProgress),
            _ => Err(CoreError::validation(vec![FieldViolation::new(
                "status",
                "invalid_value",
            )])),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
