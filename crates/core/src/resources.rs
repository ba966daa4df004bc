//! File resources attached to projects, applications and users.
//!
//! Bytes live in the [`FileStore`], metadata in the [`Store`]. The two are
//! not covered by one transaction, so upload and replace run as a two-step
//! saga: save the bytes, then write the rows. When the row write fails the
//! freshly saved bytes are deleted again; if that delete fails too the path
//! is logged as orphaned and the original database error is returned.

use std::sync::Arc;

use crate::error::CoreError;
use crate::resource::{
    FileDescriptor, FileLink, FileRecord, ModelTarget, NewFileLink, NewFileRecord, Resource,
};
use crate::storage::{FileStore, SaveRequest, StoredObject};
use crate::store::{Store, StoreTx};
use crate::types::EntityId;
use crate::validation::{validate_file_descriptor, RawInput};

/// A new file for a target entity.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub requester_id: EntityId,
    /// Id of the project, application or user named by the descriptor.
    pub target_id: EntityId,
    pub mimetype: String,
    /// Raw `{name, model_target, purpose, is_default}` map.
    pub descriptor: RawInput,
    pub bytes: Vec<u8>,
}

/// New bytes for an existing link's file.
#[derive(Debug, Clone)]
pub struct ReplaceRequest {
    pub requester_id: EntityId,
    pub link_id: EntityId,
    pub original_name: String,
    pub mimetype: String,
    pub bytes: Vec<u8>,
}

pub struct ResourceOrchestrator<S: Store, F: FileStore> {
    store: Arc<S>,
    files: Arc<F>,
}

impl<S: Store, F: FileStore> ResourceOrchestrator<S, F> {
    pub fn new(store: Arc<S>, files: Arc<F>) -> Self {
        Self { store, files }
    }

    /// Live resources of a target, oldest first.
    pub async fn list(
        &self,
        model_target: ModelTarget,
        target_id: EntityId,
    ) -> Result<Vec<Resource>, CoreError> {
        Ok(self.store.list_resources(model_target, target_id).await?)
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<Resource, CoreError> {
        let descriptor = validate_file_descriptor(&request.descriptor)?;
        self.authorize(descriptor.model_target, request.target_id, request.requester_id)
            .await?;

        let stored = self
            .files
            .save(
                &request.bytes,
                &SaveRequest {
                    original_name: descriptor.name.clone(),
                    mimetype: request.mimetype.clone(),
                    model_target: descriptor.model_target,
                    purpose: descriptor.purpose,
                },
            )
            .await?;

        match self.record_upload(&descriptor, &stored, &request).await {
            Ok(resource) => {
                tracing::info!(
                    file_id = %resource.file.id,
                    link_id = %resource.link.id,
                    model_target = descriptor.model_target.as_str(),
                    purpose = descriptor.purpose.as_str(),
                    target_id = %request.target_id,
                    "File uploaded",
                );
                Ok(resource)
            }
            Err(err) => {
                self.compensate(&stored.stored_path, &err).await;
                Err(err)
            }
        }
    }

    /// Point the link's file row at new bytes. The previous bytes stay on
    /// disk; they are never deleted here.
    pub async fn replace(&self, request: ReplaceRequest) -> Result<Resource, CoreError> {
        let link = self.find_live_link(request.link_id).await?;
        self.authorize(link.model_target, link.uuid_target, request.requester_id)
            .await?;

        let previous = self
            .store
            .find_file(link.file_id)
            .await?
            .ok_or_else(|| CoreError::not_found("File", link.file_id))?;

        let stored = self
            .files
            .save(
                &request.bytes,
                &SaveRequest {
                    original_name: request.original_name.clone(),
                    mimetype: request.mimetype.clone(),
                    model_target: link.model_target,
                    purpose: link.purpose,
                },
            )
            .await?;

        let record = new_file_record(&stored, &request.original_name, request.requester_id, false);

        match self.record_replace(link.file_id, &record).await {
            Ok(file) => {
                tracing::info!(
                    file_id = %file.id,
                    link_id = %link.id,
                    previous_path = %previous.stored_path,
                    stored_path = %file.stored_path,
                    "File replaced",
                );
                Ok(Resource { link, file })
            }
            Err(err) => {
                self.compensate(&stored.stored_path, &err).await;
                Err(err)
            }
        }
    }

    /// Hide a link. The file row and bytes are retained.
    pub async fn soft_delete(
        &self,
        link_id: EntityId,
        requester_id: EntityId,
    ) -> Result<(), CoreError> {
        let link = self.find_live_link(link_id).await?;
        self.authorize(link.model_target, link.uuid_target, requester_id)
            .await?;

        let mut tx = self.store.begin().await?;
        if !tx.soft_delete_file_link(link_id).await? {
            return Err(CoreError::not_found("FileLink", link_id));
        }
        tx.commit().await?;

        tracing::info!(%link_id, file_id = %link.file_id, "File link soft-deleted");
        Ok(())
    }

    // -- saga steps --

    async fn record_upload(
        &self,
        descriptor: &FileDescriptor,
        stored: &StoredObject,
        request: &UploadRequest,
    ) -> Result<Resource, CoreError> {
        let record = new_file_record(
            stored,
            &descriptor.name,
            request.requester_id,
            descriptor.is_default,
        );

        let mut tx = self.store.begin().await?;
        let file = tx.insert_file(&record).await?;
        let link = tx
            .insert_file_link(&NewFileLink {
                file_id: file.id,
                model_target: descriptor.model_target,
                uuid_target: request.target_id,
                purpose: descriptor.purpose,
                cardinality: descriptor.cardinality,
            })
            .await?;
        tx.commit().await?;

        Ok(Resource { link, file })
    }

    async fn record_replace(
        &self,
        file_id: EntityId,
        record: &NewFileRecord,
    ) -> Result<FileRecord, CoreError> {
        let mut tx = self.store.begin().await?;
        let file = tx
            .replace_file(file_id, record)
            .await?
            .ok_or_else(|| CoreError::not_found("File", file_id))?;
        tx.commit().await?;
        Ok(file)
    }

    /// Undo a save whose database write failed.
    async fn compensate(&self, stored_path: &str, cause: &CoreError) {
        match self.files.delete(stored_path).await {
            Ok(()) => tracing::warn!(
                %stored_path,
                error = %cause,
                "Database write failed; removed stored file",
            ),
            Err(delete_err) => tracing::error!(
                orphaned_path = %stored_path,
                error = %cause,
                delete_error = %delete_err,
                "Database write failed and stored file could not be removed",
            ),
        }
    }

    // -- helpers --

    async fn find_live_link(&self, link_id: EntityId) -> Result<FileLink, CoreError> {
        self.store
            .find_file_link(link_id)
            .await?
            .filter(FileLink::is_live)
            .ok_or_else(|| CoreError::not_found("FileLink", link_id))
    }

    /// Project files: a current team member. Application files: the author.
    /// User files: the user themself.
    async fn authorize(
        &self,
        model_target: ModelTarget,
        target_id: EntityId,
        requester_id: EntityId,
    ) -> Result<(), CoreError> {
        let allowed = match model_target {
            ModelTarget::Project => {
                if self.store.find_project(target_id).await?.is_none() {
                    return Err(CoreError::not_found("Project", target_id));
                }
                self.store
                    .find_team_member(target_id, requester_id)
                    .await?
                    .is_some()
            }
            ModelTarget::Application => {
                let application = self
                    .store
                    .find_application(target_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("Application", target_id))?;
                application.author_id == requester_id
            }
            ModelTarget::User => target_id == requester_id,
        };

        if allowed {
            Ok(())
        } else {
            Err(CoreError::Authorization(format!(
                "Not allowed to manage files of {} {target_id}",
                model_target.as_str()
            )))
        }
    }
}

fn new_file_record(
    stored: &StoredObject,
    original_name: &str,
    author_id: EntityId,
    is_default: bool,
) -> NewFileRecord {
    NewFileRecord {
        stored_path: stored.stored_path.clone(),
        stored_name: stored.stored_name.clone(),
        original_name: original_name.to_string(),
        mimetype: stored.mimetype.clone(),
        file_size: stored.file_size,
        file_kind: stored.file_kind.clone(),
        author_id,
        is_default,
    }
}
