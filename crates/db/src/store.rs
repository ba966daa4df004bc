//! [`Store`] and [`StoreTx`] backed by PostgreSQL.

use async_trait::async_trait;
use propel_core::entities::{
    Application, ApplicationFields, NewProject, NewTeamMember, Project, ProjectType, Role,
    TeamMember,
};
use propel_core::resource::{
    FileLink, FileRecord, ModelTarget, NewFileLink, NewFileRecord, Resource,
};
use propel_core::status::{ApplicationStatus, ProjectStatus};
use propel_core::store::{Store, StoreResult, StoreTx};
use propel_core::types::{Date, DbId, EntityId};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::classify_sqlx_error;
use crate::repositories::{
    ApplicationRepo, FileLinkRepo, FileRepo, ProjectRepo, ProjectTypeRepo, RoleRepo,
    TeamMemberRepo, UserRepo,
};

/// Pool-backed store. Cloning shares the pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// An open transaction. Dropping it without [`StoreTx::commit`] rolls back.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> StoreResult<PgTx> {
        let tx = self.pool.begin().await.map_err(classify_sqlx_error)?;
        Ok(PgTx { tx })
    }

    async fn find_application(&self, id: EntityId) -> StoreResult<Option<Application>> {
        ApplicationRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify_sqlx_error)?
            .map(Application::try_from)
            .transpose()
    }

    async fn find_project(&self, id: EntityId) -> StoreResult<Option<Project>> {
        ProjectRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify_sqlx_error)?
            .map(Project::try_from)
            .transpose()
    }

    async fn find_project_by_application(
        &self,
        application_id: EntityId,
    ) -> StoreResult<Option<Project>> {
        ProjectRepo::find_by_application(&self.pool, application_id)
            .await
            .map_err(classify_sqlx_error)?
            .map(Project::try_from)
            .transpose()
    }

    async fn find_project_type(&self, id: DbId) -> StoreResult<Option<ProjectType>> {
        ProjectTypeRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        Ok(RoleRepo::find_by_name(&self.pool, name)
            .await
            .map_err(classify_sqlx_error)?
            .map(Role::from))
    }

    async fn user_exists(&self, id: EntityId) -> StoreResult<bool> {
        UserRepo::exists(&self.pool, id)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn list_team_members(&self, project_id: EntityId) -> StoreResult<Vec<TeamMember>> {
        let rows = TeamMemberRepo::list_by_project(&self.pool, project_id)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(rows.into_iter().map(TeamMember::from).collect())
    }

    async fn find_team_member(
        &self,
        project_id: EntityId,
        user_id: EntityId,
    ) -> StoreResult<Option<TeamMember>> {
        Ok(TeamMemberRepo::find(&self.pool, project_id, user_id)
            .await
            .map_err(classify_sqlx_error)?
            .map(TeamMember::from))
    }

    async fn find_file_link(&self, link_id: EntityId) -> StoreResult<Option<FileLink>> {
        FileLinkRepo::find_by_id(&self.pool, link_id)
            .await
            .map_err(classify_sqlx_error)?
            .map(FileLink::try_from)
            .transpose()
    }

    async fn find_file(&self, file_id: EntityId) -> StoreResult<Option<FileRecord>> {
        Ok(FileRepo::find_by_id(&self.pool, file_id)
            .await
            .map_err(classify_sqlx_error)?
            .map(FileRecord::from))
    }

    async fn list_resources(
        &self,
        model_target: ModelTarget,
        uuid_target: EntityId,
    ) -> StoreResult<Vec<Resource>> {
        FileLinkRepo::list_resources(&self.pool, model_target.as_str(), uuid_target)
            .await
            .map_err(classify_sqlx_error)?
            .into_iter()
            .map(Resource::try_from)
            .collect()
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(classify_sqlx_error)
    }

    async fn insert_application(
        &mut self,
        author_id: EntityId,
        fields: &ApplicationFields,
    ) -> StoreResult<Application> {
        ApplicationRepo::create(&mut *self.tx, author_id, fields)
            .await
            .map_err(classify_sqlx_error)?
            .try_into()
    }

    async fn update_application(
        &mut self,
        id: EntityId,
        fields: &ApplicationFields,
    ) -> StoreResult<Option<Application>> {
        ApplicationRepo::update(&mut *self.tx, id, fields)
            .await
            .map_err(classify_sqlx_error)?
            .map(Application::try_from)
            .transpose()
    }

    async fn set_application_status(
        &mut self,
        id: EntityId,
        status: ApplicationStatus,
    ) -> StoreResult<bool> {
        ApplicationRepo::set_status(&mut *self.tx, id, status.as_str())
            .await
            .map_err(classify_sqlx_error)
    }

    async fn set_application_project_types(
        &mut self,
        id: EntityId,
        project_type_ids: &[DbId],
    ) -> StoreResult<()> {
        ApplicationRepo::set_project_types(&mut *self.tx, id, project_type_ids)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn set_application_deadline(
        &mut self,
        id: EntityId,
        deadline: Date,
    ) -> StoreResult<bool> {
        ApplicationRepo::set_deadline(&mut *self.tx, id, deadline)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn soft_delete_application(&mut self, id: EntityId) -> StoreResult<bool> {
        ApplicationRepo::soft_delete(&mut *self.tx, id)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn insert_project(&mut self, input: &NewProject) -> StoreResult<Project> {
        ProjectRepo::create(&mut *self.tx, input)
            .await
            .map_err(classify_sqlx_error)?
            .try_into()
    }

    async fn transition_project_status(
        &mut self,
        id: EntityId,
        from: ProjectStatus,
        to: ProjectStatus,
    ) -> StoreResult<bool> {
        ProjectRepo::transition_status(&mut *self.tx, id, from.as_str(), to.as_str())
            .await
            .map_err(classify_sqlx_error)
    }

    async fn delete_project(&mut self, id: EntityId) -> StoreResult<bool> {
        ProjectRepo::delete(&mut *self.tx, id)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn insert_team_member(&mut self, input: &NewTeamMember) -> StoreResult<TeamMember> {
        Ok(TeamMemberRepo::create(&mut *self.tx, input)
            .await
            .map_err(classify_sqlx_error)?
            .into())
    }

    async fn insert_team_members_skip_duplicates(
        &mut self,
        inputs: &[NewTeamMember],
    ) -> StoreResult<Vec<TeamMember>> {
        let rows = TeamMemberRepo::create_many_skip_duplicates(&mut *self.tx, inputs)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(rows.into_iter().map(TeamMember::from).collect())
    }

    async fn update_team_member_role(
        &mut self,
        project_id: EntityId,
        user_id: EntityId,
        role_id: DbId,
    ) -> StoreResult<Option<TeamMember>> {
        Ok(
            TeamMemberRepo::update_role(&mut *self.tx, project_id, user_id, role_id)
                .await
                .map_err(classify_sqlx_error)?
                .map(TeamMember::from),
        )
    }

    async fn delete_team_member(
        &mut self,
        project_id: EntityId,
        user_id: EntityId,
    ) -> StoreResult<bool> {
        TeamMemberRepo::delete(&mut *self.tx, project_id, user_id)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn delete_team_members(&mut self, project_id: EntityId) -> StoreResult<u64> {
        TeamMemberRepo::delete_by_project(&mut *self.tx, project_id)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn insert_file(&mut self, input: &NewFileRecord) -> StoreResult<FileRecord> {
        Ok(FileRepo::create(&mut *self.tx, input)
            .await
            .map_err(classify_sqlx_error)?
            .into())
    }

    async fn replace_file(
        &mut self,
        id: EntityId,
        input: &NewFileRecord,
    ) -> StoreResult<Option<FileRecord>> {
        Ok(FileRepo::replace(&mut *self.tx, id, input)
            .await
            .map_err(classify_sqlx_error)?
            .map(FileRecord::from))
    }

    async fn insert_file_link(&mut self, input: &NewFileLink) -> StoreResult<FileLink> {
        FileLinkRepo::create(&mut *self.tx, input)
            .await
            .map_err(classify_sqlx_error)?
            .try_into()
    }

    async fn soft_delete_file_link(&mut self, id: EntityId) -> StoreResult<bool> {
        FileLinkRepo::soft_delete(&mut *self.tx, id)
            .await
            .map_err(classify_sqlx_error)
    }
}
