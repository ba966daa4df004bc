//! Persistence port.
//!
//! [`Store`] exposes reads and opens transactions; [`StoreTx`] carries every
//! write. A transaction that is dropped without [`StoreTx::commit`] must leave
//! zero rows changed.

use async_trait::async_trait;

use crate::entities::{
    Application, ApplicationFields, NewProject, NewTeamMember, Project, ProjectType, Role,
    TeamMember,
};
use crate::resource::{FileLink, FileRecord, ModelTarget, NewFileLink, NewFileRecord, Resource};
use crate::status::{ApplicationStatus, ProjectStatus};
use crate::types::{Date, DbId, EntityId};

/// Failure reported by a persistence adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync + 'static>),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read side of the persistence port plus the transaction factory.
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: StoreTx;

    /// Open a transaction. Dropping it without commit rolls back.
    async fn begin(&self) -> StoreResult<Self::Tx>;

    /// Find a non-deleted application.
    async fn find_application(&self, id: EntityId) -> StoreResult<Option<Application>>;

    async fn find_project(&self, id: EntityId) -> StoreResult<Option<Project>>;

    async fn find_project_by_application(
        &self,
        application_id: EntityId,
    ) -> StoreResult<Option<Project>>;

    /// Find a project type together with its role constraints.
    async fn find_project_type(&self, id: DbId) -> StoreResult<Option<ProjectType>>;

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>>;

    async fn user_exists(&self, id: EntityId) -> StoreResult<bool>;

    async fn list_team_members(&self, project_id: EntityId) -> StoreResult<Vec<TeamMember>>;

    async fn find_team_member(
        &self,
        project_id: EntityId,
        user_id: EntityId,
    ) -> StoreResult<Option<TeamMember>>;

    async fn find_file_link(&self, link_id: EntityId) -> StoreResult<Option<FileLink>>;

    async fn find_file(&self, file_id: EntityId) -> StoreResult<Option<FileRecord>>;

    /// Live links for a target, joined with their file rows, oldest first.
    async fn list_resources(
        &self,
        model_target: ModelTarget,
        uuid_target: EntityId,
    ) -> StoreResult<Vec<Resource>>;
}

/// Write side of the persistence port. All methods run inside one transaction.
#[async_trait]
pub trait StoreTx: Send + Sized {
    async fn commit(self) -> StoreResult<()>;

    // --- Applications ---

    async fn insert_application(
        &mut self,
        author_id: EntityId,
        fields: &ApplicationFields,
    ) -> StoreResult<Application>;

    /// Overwrite editable fields. Returns `None` if the row does not exist.
    async fn update_application(
        &mut self,
        id: EntityId,
        fields: &ApplicationFields,
    ) -> StoreResult<Option<Application>>;

    async fn set_application_status(
        &mut self,
        id: EntityId,
        status: ApplicationStatus,
    ) -> StoreResult<bool>;

    async fn set_application_project_types(
        &mut self,
        id: EntityId,
        project_type_ids: &[DbId],
    ) -> StoreResult<()>;

    async fn set_application_deadline(&mut self, id: EntityId, deadline: Date)
        -> StoreResult<bool>;

    async fn soft_delete_application(&mut self, id: EntityId) -> StoreResult<bool>;

    // --- Projects ---

    async fn insert_project(&mut self, input: &NewProject) -> StoreResult<Project>;

    /// Compare-and-set the status. Returns `false` when the row is absent or
    /// its status is not `from`.
    async fn transition_project_status(
        &mut self,
        id: EntityId,
        from: ProjectStatus,
        to: ProjectStatus,
    ) -> StoreResult<bool>;

    async fn delete_project(&mut self, id: EntityId) -> StoreResult<bool>;

    // --- Team members ---

    async fn insert_team_member(&mut self, input: &NewTeamMember) -> StoreResult<TeamMember>;

    /// Insert many members, skipping `(project_id, user_id)` pairs that already
    /// exist. Returns only the rows actually inserted.
    async fn insert_team_members_skip_duplicates(
        &mut self,
        inputs: &[NewTeamMember],
    ) -> StoreResult<Vec<TeamMember>>;

    async fn update_team_member_role(
        &mut self,
        project_id: EntityId,
        user_id: EntityId,
        role_id: DbId,
    ) -> StoreResult<Option<TeamMember>>;

    async fn delete_team_member(
        &mut self,
        project_id: EntityId,
        user_id: EntityId,
    ) -> StoreResult<bool>;

    async fn delete_team_members(&mut self, project_id: EntityId) -> StoreResult<u64>;

    // --- Files ---

    async fn insert_file(&mut self, input: &NewFileRecord) -> StoreResult<FileRecord>;

    /// Point an existing file row at new bytes. Returns `None` if absent.
    async fn replace_file(
        &mut self,
        id: EntityId,
        input: &NewFileRecord,
    ) -> StoreResult<Option<FileRecord>>;

    async fn insert_file_link(&mut self, input: &NewFileLink) -> StoreResult<FileLink>;

    /// Mark a live link deleted. Returns `false` if absent or already deleted.
    async fn soft_delete_file_link(&mut self, id: EntityId) -> StoreResult<bool>;
}
