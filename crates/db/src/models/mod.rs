//! Row models.
//!
//! Each submodule holds a `FromRow` struct matching the database row and a
//! conversion into the corresponding `propel_core` entity. Enum columns are
//! stored as TEXT and decoded here.

pub mod application;
pub mod file;
pub mod project;
pub mod project_type;
pub mod role;
pub mod team_member;
