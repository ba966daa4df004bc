//! Construct-time entity validators.
//!
//! Each validator turns a raw input map into normalized primitives or fails
//! with a single `CoreError::Validation` listing every offending field.

pub mod application;
pub mod file_descriptor;
pub mod project;
pub mod rules;
pub mod team_member;

pub use application::validate_application;
pub use file_descriptor::validate_file_descriptor;
pub use project::{validate_approval, ApprovalRequest};
pub use rules::{FieldChecker, RawInput};
pub use team_member::{validate_role_change, validate_team_batch, validate_team_member};
