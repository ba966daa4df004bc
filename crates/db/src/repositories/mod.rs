//! Repository layer.
//!
//! Each repository is a zero-sized struct with async methods. Single-statement
//! methods accept any `PgExecutor` so they run against the pool or inside a
//! transaction; multi-statement writes take `&mut PgConnection`.

pub mod application_repo;
pub mod file_link_repo;
pub mod file_repo;
pub mod project_repo;
pub mod project_type_repo;
pub mod role_repo;
pub mod team_member_repo;
pub mod user_repo;

pub use application_repo::ApplicationRepo;
pub use file_link_repo::FileLinkRepo;
pub use file_repo::FileRepo;
pub use project_repo::ProjectRepo;
pub use project_type_repo::ProjectTypeRepo;
pub use role_repo::RoleRepo;
pub use team_member_repo::TeamMemberRepo;
pub use user_repo::UserRepo;
