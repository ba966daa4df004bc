//! In-memory fakes of the persistence and file-store ports.
//!
//! [`InMemoryStore`] stages every transaction on a copy of the state and
//! swaps it in on commit, so a failed or dropped transaction changes nothing.
//! It enforces the same unique and foreign-key constraints as the Postgres
//! schema and can be armed to fail the n-th write.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::entities::{
    Application, ApplicationFields, NewProject, NewTeamMember, Project, ProjectType, Role,
    TeamMember,
};
use crate::resource::{
    Cardinality, FileLink, FileRecord, ModelTarget, NewFileLink, NewFileRecord, Resource,
};
use crate::status::{ApplicationStatus, ProjectStatus};
use crate::storage::{file_kind_for, FileStore, FileStoreError, SaveRequest, StoredObject};
use crate::store::{Store, StoreError, StoreResult, StoreTx};
use crate::types::{Date, DbId, EntityId};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct State {
    applications: HashMap<EntityId, Application>,
    projects: HashMap<EntityId, Project>,
    project_types: HashMap<DbId, ProjectType>,
    roles: Vec<Role>,
    users: HashSet<EntityId>,
    team_members: Vec<TeamMember>,
    files: HashMap<EntityId, FileRecord>,
    links: Vec<FileLink>,
}

type Interleaved = Box<dyn FnOnce(&InMemoryStore) + Send>;

#[derive(Default)]
struct Faults {
    /// 1-based write number that fails, counted from when it was armed.
    fail_on_write: Mutex<Option<usize>>,
    writes: AtomicUsize,
    /// Runs once, committed, before the next transaction opens.
    before_begin: Mutex<Option<Interleaved>>,
}

impl std::fmt::Debug for Faults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Faults")
            .field("fail_on_write", &self.fail_on_write)
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`-th transactional write from now on fail with a generic error.
    pub fn fail_on_write(&self, n: usize) {
        *lock(&self.faults.fail_on_write) = Some(n);
        self.faults.writes.store(0, Ordering::SeqCst);
    }

    /// Commit `write` as a competing change just before the next
    /// [`Store::begin`], after the caller has done its reads.
    pub fn interleave_before_next_begin(
        &self,
        write: impl FnOnce(&InMemoryStore) + Send + 'static,
    ) {
        *lock(&self.faults.before_begin) = Some(Box::new(write));
    }

    /// Overwrite a project's status outside any transaction.
    pub fn force_project_status(&self, id: EntityId, status: ProjectStatus) {
        if let Some(project) = lock(&self.state).projects.get_mut(&id) {
            project.status = status;
        }
    }

    /// Delete a project and its members outside any transaction.
    pub fn force_delete_project(&self, id: EntityId) {
        let mut state = lock(&self.state);
        state.projects.remove(&id);
        state.team_members.retain(|m| m.project_id != id);
    }

    pub fn seed_user(&self) -> EntityId {
        let id = EntityId::new_v4();
        lock(&self.state).users.insert(id);
        id
    }

    pub fn seed_role(&self, name: &str) -> Role {
        let mut state = lock(&self.state);
        let role = Role {
            id: state.roles.len() as DbId + 1,
            name: name.to_string(),
        };
        state.roles.push(role.clone());
        role
    }

    pub fn seed_project_type(&self, project_type: ProjectType) {
        lock(&self.state)
            .project_types
            .insert(project_type.id, project_type);
    }

    /// Insert an application directly, bypassing validation.
    pub fn seed_application(&self, author_id: EntityId, fields: ApplicationFields) -> Application {
        let now = Utc::now();
        let application = Application {
            id: EntityId::new_v4(),
            author_id,
            title: fields.title,
            short_description: fields.short_description,
            long_description: fields.long_description,
            deadline: fields.deadline,
            project_type_ids: fields.project_type_ids,
            faculty_ids: fields.faculty_ids,
            problem_type_ids: fields.problem_type_ids,
            custom_problem_type: fields.custom_problem_type,
            status: ApplicationStatus::InReview,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        lock(&self.state)
            .applications
            .insert(application.id, application.clone());
        application
    }

    pub fn application(&self, id: EntityId) -> Option<Application> {
        lock(&self.state).applications.get(&id).cloned()
    }

    pub fn projects(&self) -> Vec<Project> {
        lock(&self.state).projects.values().cloned().collect()
    }

    pub fn team_members(&self, project_id: EntityId) -> Vec<TeamMember> {
        lock(&self.state)
            .team_members
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn all_team_members(&self) -> Vec<TeamMember> {
        lock(&self.state).team_members.clone()
    }

    pub fn files(&self) -> Vec<FileRecord> {
        lock(&self.state).files.values().cloned().collect()
    }

    pub fn links(&self) -> Vec<FileLink> {
        lock(&self.state).links.clone()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> StoreResult<InMemoryTx> {
        let interleaved = lock(&self.faults.before_begin).take();
        if let Some(write) = interleaved {
            write(self);
        }
        Ok(InMemoryTx {
            staged: lock(&self.state).clone(),
            shared: Arc::clone(&self.state),
            faults: Arc::clone(&self.faults),
        })
    }

    async fn find_application(&self, id: EntityId) -> StoreResult<Option<Application>> {
        Ok(lock(&self.state)
            .applications
            .get(&id)
            .filter(|a| a.deleted_at.is_none())
            .cloned())
    }

    async fn find_project(&self, id: EntityId) -> StoreResult<Option<Project>> {
        Ok(lock(&self.state).projects.get(&id).cloned())
    }

    async fn find_project_by_application(
        &self,
        application_id: EntityId,
    ) -> StoreResult<Option<Project>> {
        Ok(lock(&self.state)
            .projects
            .values()
            .find(|p| p.application_id == application_id)
            .cloned())
    }

    async fn find_project_type(&self, id: DbId) -> StoreResult<Option<ProjectType>> {
        Ok(lock(&self.state).project_types.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        Ok(lock(&self.state)
            .roles
            .iter()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn user_exists(&self, id: EntityId) -> StoreResult<bool> {
        Ok(lock(&self.state).users.contains(&id))
    }

    async fn list_team_members(&self, project_id: EntityId) -> StoreResult<Vec<TeamMember>> {
        Ok(self.team_members(project_id))
    }

    async fn find_team_member(
        &self,
        project_id: EntityId,
        user_id: EntityId,
    ) -> StoreResult<Option<TeamMember>> {
        Ok(lock(&self.state)
            .team_members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_file_link(&self, link_id: EntityId) -> StoreResult<Option<FileLink>> {
        Ok(lock(&self.state)
            .links
            .iter()
            .find(|l| l.id == link_id)
            .cloned())
    }

    async fn find_file(&self, file_id: EntityId) -> StoreResult<Option<FileRecord>> {
        Ok(lock(&self.state).files.get(&file_id).cloned())
    }

    async fn list_resources(
        &self,
        model_target: ModelTarget,
        uuid_target: EntityId,
    ) -> StoreResult<Vec<Resource>> {
        let state = lock(&self.state);
        let mut resources: Vec<Resource> = state
            .links
            .iter()
            .filter(|l| l.is_live() && l.model_target == model_target && l.uuid_target == uuid_target)
            .filter_map(|l| {
                state.files.get(&l.file_id).map(|f| Resource {
                    link: l.clone(),
                    file: f.clone(),
                })
            })
            .collect();
        resources.sort_by_key(|r| r.link.created_at);
        Ok(resources)
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct InMemoryTx {
    staged: State,
    shared: Arc<Mutex<State>>,
    faults: Arc<Faults>,
}

fn unique(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn foreign_key(constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

impl InMemoryTx {
    fn write(&self) -> StoreResult<()> {
        let n = self.faults.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if *lock(&self.faults.fail_on_write) == Some(n) {
            return Err(StoreError::Other(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection lost",
            ))));
        }
        Ok(())
    }

    fn check_application_tags(&self, fields: &ApplicationFields) -> StoreResult<()> {
        if fields
            .project_type_ids
            .iter()
            .any(|id| !self.staged.project_types.contains_key(id))
        {
            return Err(foreign_key("fk_application_project_types_project_type_id"));
        }
        Ok(())
    }

    fn check_member(&self, input: &NewTeamMember) -> StoreResult<()> {
        if !self.staged.projects.contains_key(&input.project_id) {
            return Err(foreign_key("fk_team_members_project_id"));
        }
        if !self.staged.users.contains(&input.user_id) {
            return Err(foreign_key("fk_team_members_user_id"));
        }
        if !self.staged.roles.iter().any(|r| r.id == input.role_id) {
            return Err(foreign_key("fk_team_members_role_id"));
        }
        Ok(())
    }

    fn has_member(&self, project_id: EntityId, user_id: EntityId) -> bool {
        self.staged
            .team_members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id)
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn commit(self) -> StoreResult<()> {
        *lock(&self.shared) = self.staged;
        Ok(())
    }

    async fn insert_application(
        &mut self,
        author_id: EntityId,
        fields: &ApplicationFields,
    ) -> StoreResult<Application> {
        self.write()?;
        if !self.staged.users.contains(&author_id) {
            return Err(foreign_key("fk_applications_author_id"));
        }
        self.check_application_tags(fields)?;
        let now = Utc::now();
        let application = Application {
            id: EntityId::new_v4(),
            author_id,
            title: fields.title.clone(),
            short_description: fields.short_description.clone(),
            long_description: fields.long_description.clone(),
            deadline: fields.deadline,
            project_type_ids: fields.project_type_ids.clone(),
            faculty_ids: fields.faculty_ids.clone(),
            problem_type_ids: fields.problem_type_ids.clone(),
            custom_problem_type: fields.custom_problem_type.clone(),
            status: ApplicationStatus::InReview,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.staged
            .applications
            .insert(application.id, application.clone());
        Ok(application)
    }

    async fn update_application(
        &mut self,
        id: EntityId,
        fields: &ApplicationFields,
    ) -> StoreResult<Option<Application>> {
        self.write()?;
        self.check_application_tags(fields)?;
        let Some(app) = self
            .staged
            .applications
            .get_mut(&id)
            .filter(|a| a.deleted_at.is_none())
        else {
            return Ok(None);
        };
        app.title = fields.title.clone();
        app.short_description = fields.short_description.clone();
        app.long_description = fields.long_description.clone();
        app.deadline = fields.deadline;
        app.project_type_ids = fields.project_type_ids.clone();
        app.faculty_ids = fields.faculty_ids.clone();
        app.problem_type_ids = fields.problem_type_ids.clone();
        app.custom_problem_type = fields.custom_problem_type.clone();
        app.updated_at = Utc::now();
        Ok(Some(app.clone()))
    }

    async fn set_application_status(
        &mut self,
        id: EntityId,
        status: ApplicationStatus,
    ) -> StoreResult<bool> {
        self.write()?;
        Ok(match self.staged.applications.get_mut(&id) {
            Some(app) if app.deleted_at.is_none() => {
                app.status = status;
                app.updated_at = Utc::now();
                true
            }
            _ => false,
        })
    }

    async fn set_application_project_types(
        &mut self,
        id: EntityId,
        project_type_ids: &[DbId],
    ) -> StoreResult<()> {
        self.write()?;
        if project_type_ids
            .iter()
            .any(|pt| !self.staged.project_types.contains_key(pt))
        {
            return Err(foreign_key("fk_application_project_types_project_type_id"));
        }
        match self.staged.applications.get_mut(&id) {
            Some(app) => {
                app.project_type_ids = project_type_ids.to_vec();
                Ok(())
            }
            None => Err(foreign_key("fk_application_project_types_application_id")),
        }
    }

    async fn set_application_deadline(
        &mut self,
        id: EntityId,
        deadline: Date,
    ) -> StoreResult<bool> {
        self.write()?;
        Ok(match self.staged.applications.get_mut(&id) {
            Some(app) if app.deleted_at.is_none() => {
                app.deadline = deadline;
                app.updated_at = Utc::now();
                true
            }
            _ => false,
        })
    }

    async fn soft_delete_application(&mut self, id: EntityId) -> StoreResult<bool> {
        self.write()?;
        Ok(match self.staged.applications.get_mut(&id) {
            Some(app) if app.deleted_at.is_none() => {
                app.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        })
    }

    async fn insert_project(&mut self, input: &NewProject) -> StoreResult<Project> {
        self.write()?;
        if !self.staged.applications.contains_key(&input.application_id) {
            return Err(foreign_key("fk_projects_application_id"));
        }
        if !self.staged.users.contains(&input.creator_id) {
            return Err(foreign_key("fk_projects_creator_id"));
        }
        if self
            .staged
            .projects
            .values()
            .any(|p| p.application_id == input.application_id)
        {
            return Err(unique("uq_projects_application_id"));
        }
        let now = Utc::now();
        let project = Project {
            id: EntityId::new_v4(),
            application_id: input.application_id,
            creator_id: input.creator_id,
            status: ProjectStatus::ProjectApproved,
            created_at: now,
            updated_at: now,
        };
        self.staged.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn transition_project_status(
        &mut self,
        id: EntityId,
        from: ProjectStatus,
        to: ProjectStatus,
    ) -> StoreResult<bool> {
        self.write()?;
        Ok(match self.staged.projects.get_mut(&id) {
            Some(project) if project.status == from => {
                project.status = to;
                project.updated_at = Utc::now();
                true
            }
            _ => false,
        })
    }

    async fn delete_project(&mut self, id: EntityId) -> StoreResult<bool> {
        self.write()?;
        let removed = self.staged.projects.remove(&id).is_some();
        // ON DELETE CASCADE
        self.staged.team_members.retain(|m| m.project_id != id);
        Ok(removed)
    }

    async fn insert_team_member(&mut self, input: &NewTeamMember) -> StoreResult<TeamMember> {
        self.write()?;
        self.check_member(input)?;
        if self.has_member(input.project_id, input.user_id) {
            return Err(unique("uq_team_members_project_user"));
        }
        let member = TeamMember {
            project_id: input.project_id,
            user_id: input.user_id,
            role_id: input.role_id,
            created_at: Utc::now(),
        };
        self.staged.team_members.push(member.clone());
        Ok(member)
    }

    async fn insert_team_members_skip_duplicates(
        &mut self,
        inputs: &[NewTeamMember],
    ) -> StoreResult<Vec<TeamMember>> {
        self.write()?;
        let mut inserted = Vec::new();
        for input in inputs {
            self.check_member(input)?;
            if self.has_member(input.project_id, input.user_id) {
                continue;
            }
            let member = TeamMember {
                project_id: input.project_id,
                user_id: input.user_id,
                role_id: input.role_id,
                created_at: Utc::now(),
            };
            self.staged.team_members.push(member.clone());
            inserted.push(member);
        }
        Ok(inserted)
    }

    async fn update_team_member_role(
        &mut self,
        project_id: EntityId,
        user_id: EntityId,
        role_id: DbId,
    ) -> StoreResult<Option<TeamMember>> {
        self.write()?;
        if !self.staged.roles.iter().any(|r| r.id == role_id) {
            return Err(foreign_key("fk_team_members_role_id"));
        }
        Ok(self
            .staged
            .team_members
            .iter_mut()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .map(|m| {
                m.role_id = role_id;
                m.clone()
            }))
    }

    async fn delete_team_member(
        &mut self,
        project_id: EntityId,
        user_id: EntityId,
    ) -> StoreResult<bool> {
        self.write()?;
        let before = self.staged.team_members.len();
        self.staged
            .team_members
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        Ok(self.staged.team_members.len() < before)
    }

    async fn delete_team_members(&mut self, project_id: EntityId) -> StoreResult<u64> {
        self.write()?;
        let before = self.staged.team_members.len();
        self.staged
            .team_members
            .retain(|m| m.project_id != project_id);
        Ok((before - self.staged.team_members.len()) as u64)
    }

    async fn insert_file(&mut self, input: &NewFileRecord) -> StoreResult<FileRecord> {
        self.write()?;
        if !self.staged.users.contains(&input.author_id) {
            return Err(foreign_key("fk_files_author_id"));
        }
        let now = Utc::now();
        let file = FileRecord {
            id: EntityId::new_v4(),
            stored_path: input.stored_path.clone(),
            stored_name: input.stored_name.clone(),
            original_name: input.original_name.clone(),
            mimetype: input.mimetype.clone(),
            file_size: input.file_size,
            file_kind: input.file_kind.clone(),
            author_id: input.author_id,
            is_default: input.is_default,
            created_at: now,
            updated_at: now,
        };
        self.staged.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn replace_file(
        &mut self,
        id: EntityId,
        input: &NewFileRecord,
    ) -> StoreResult<Option<FileRecord>> {
        self.write()?;
        Ok(self.staged.files.get_mut(&id).map(|file| {
            file.stored_path = input.stored_path.clone();
            file.stored_name = input.stored_name.clone();
            file.original_name = input.original_name.clone();
            file.mimetype = input.mimetype.clone();
            file.file_size = input.file_size;
            file.file_kind = input.file_kind.clone();
            file.author_id = input.author_id;
            file.is_default = input.is_default;
            file.updated_at = Utc::now();
            file.clone()
        }))
    }

    async fn insert_file_link(&mut self, input: &NewFileLink) -> StoreResult<FileLink> {
        self.write()?;
        if !self.staged.files.contains_key(&input.file_id) {
            return Err(foreign_key("fk_file_links_file_id"));
        }
        let clash = self.staged.links.iter().any(|l| {
            l.is_live()
                && l.model_target == input.model_target
                && l.uuid_target == input.uuid_target
                && l.purpose == input.purpose
                && (input.cardinality == Cardinality::One || l.file_id == input.file_id)
        });
        if clash {
            return Err(unique(match input.cardinality {
                Cardinality::One => "uq_file_links_single",
                Cardinality::Many => "uq_file_links_multi",
            }));
        }
        let link = FileLink {
            id: EntityId::new_v4(),
            file_id: input.file_id,
            model_target: input.model_target,
            uuid_target: input.uuid_target,
            purpose: input.purpose,
            cardinality: input.cardinality,
            deleted_at: None,
            created_at: Utc::now(),
        };
        self.staged.links.push(link.clone());
        Ok(link)
    }

    async fn soft_delete_file_link(&mut self, id: EntityId) -> StoreResult<bool> {
        self.write()?;
        Ok(match self.staged.links.iter_mut().find(|l| l.id == id) {
            Some(link) if link.deleted_at.is_none() => {
                link.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        })
    }
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// File store that keeps bytes in memory and records every call.
#[derive(Debug, Default)]
pub struct RecordingFileStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    saves: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    fail_save: Mutex<bool>,
    fail_delete: Mutex<bool>,
}

impl RecordingFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self) {
        *lock(&self.fail_save) = true;
    }

    pub fn fail_deletes(&self) {
        *lock(&self.fail_delete) = true;
    }

    /// Paths returned by `save`, in call order.
    pub fn saved_paths(&self) -> Vec<String> {
        lock(&self.saves).clone()
    }

    /// Paths passed to `delete`, in call order (including failed attempts).
    pub fn deleted_paths(&self) -> Vec<String> {
        lock(&self.deletes).clone()
    }

    pub fn contains(&self, stored_path: &str) -> bool {
        lock(&self.objects).contains_key(stored_path)
    }
}

#[async_trait]
impl FileStore for RecordingFileStore {
    async fn save(&self, bytes: &[u8], request: &SaveRequest) -> Result<StoredObject, FileStoreError> {
        if *lock(&self.fail_save) {
            return Err(FileStoreError::Backend("save refused".into()));
        }
        let stored_name = format!("{}-{}", EntityId::new_v4(), request.original_name);
        let stored_path = format!(
            "{}/{}/{}",
            request.model_target.as_str(),
            request.purpose.as_str(),
            stored_name
        );
        lock(&self.objects).insert(stored_path.clone(), bytes.to_vec());
        lock(&self.saves).push(stored_path.clone());
        Ok(StoredObject {
            stored_path,
            stored_name,
            mimetype: request.mimetype.clone(),
            file_size: bytes.len() as i64,
            file_kind: file_kind_for(&request.mimetype).to_string(),
        })
    }

    async fn delete(&self, stored_path: &str) -> Result<(), FileStoreError> {
        lock(&self.deletes).push(stored_path.to_string());
        if *lock(&self.fail_delete) {
            return Err(FileStoreError::Backend("delete refused".into()));
        }
        lock(&self.objects).remove(stored_path);
        Ok(())
    }
}
