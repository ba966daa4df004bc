//! Domain logic for sponsored project proposals.
//!
//! Validation, lifecycle orchestration, team composition and file resources
//! live here, written against the [`store::Store`] and [`storage::FileStore`]
//! ports. No database or HTTP types leak into this crate.

pub mod applications;
pub mod deadline;
pub mod entities;
pub mod error;
pub mod lifecycle;
pub mod resource;
pub mod resources;
pub mod roles;
pub mod status;
pub mod storage;
pub mod store;
pub mod team;
pub mod team_composition;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
