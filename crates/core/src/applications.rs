//! Application submission and review.

use std::sync::Arc;

use chrono::Utc;

use crate::deadline::validate_deadline;
use crate::entities::{Application, ApplicationFields};
use crate::error::CoreError;
use crate::status::ApplicationStatus;
use crate::store::{Store, StoreTx};
use crate::types::EntityId;
use crate::validation::{validate_application, RawInput};

pub const RULE_NOT_EDITABLE: &str = "application_not_editable";
pub const RULE_NOT_IN_REVIEW: &str = "application_not_in_review";
pub const RULE_HAS_PROJECT: &str = "application_has_project";

pub struct ApplicationService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> ApplicationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: EntityId) -> Result<Application, CoreError> {
        self.store
            .find_application(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Application", id))
    }

    /// Validate and store a new application in review.
    pub async fn submit(
        &self,
        author_id: EntityId,
        input: &RawInput,
    ) -> Result<Application, CoreError> {
        let fields = validate_application(input)?;

        if !self.store.user_exists(author_id).await? {
            return Err(CoreError::not_found("User", author_id));
        }
        self.check_creation_deadline(&fields).await?;

        let mut tx = self.store.begin().await?;
        let application = tx.insert_application(author_id, &fields).await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application.id,
            %author_id,
            "Application submitted",
        );
        Ok(application)
    }

    /// Overwrite an application's fields. A rejected application returns to
    /// review when edited.
    pub async fn update(
        &self,
        id: EntityId,
        requester_id: EntityId,
        input: &RawInput,
    ) -> Result<Application, CoreError> {
        let fields = validate_application(input)?;
        let current = self.find_authored(id, requester_id).await?;

        if !current.status.is_editable() {
            return Err(CoreError::rule(
                RULE_NOT_EDITABLE,
                format!("Application cannot be edited while {}", current.status),
            ));
        }
        if self.store.find_project_by_application(id).await?.is_some() {
            return Err(CoreError::rule(
                RULE_NOT_EDITABLE,
                "Application is referenced by a project",
            ));
        }
        self.check_creation_deadline(&fields).await?;

        let mut tx = self.store.begin().await?;
        let mut application = tx
            .update_application(id, &fields)
            .await?
            .ok_or_else(|| CoreError::not_found("Application", id))?;
        if application.status == ApplicationStatus::Rejected {
            tx.set_application_status(id, ApplicationStatus::InReview)
                .await?;
            application.status = ApplicationStatus::InReview;
        }
        tx.commit().await?;

        tracing::info!(application_id = %id, "Application updated");
        Ok(application)
    }

    pub async fn reject(
        &self,
        id: EntityId,
        reviewer_id: EntityId,
    ) -> Result<Application, CoreError> {
        let mut application = self.get(id).await?;
        if application.status != ApplicationStatus::InReview {
            return Err(CoreError::rule(
                RULE_NOT_IN_REVIEW,
                format!(
                    "Only applications in review can be rejected (current status: {})",
                    application.status
                ),
            ));
        }

        let mut tx = self.store.begin().await?;
        if !tx
            .set_application_status(id, ApplicationStatus::Rejected)
            .await?
        {
            return Err(CoreError::not_found("Application", id));
        }
        tx.commit().await?;

        tracing::info!(application_id = %id, %reviewer_id, "Application rejected");

        application.status = ApplicationStatus::Rejected;
        application.updated_at = Utc::now();
        Ok(application)
    }

    /// Soft-delete an application that never became a project.
    pub async fn delete(&self, id: EntityId, requester_id: EntityId) -> Result<(), CoreError> {
        self.find_authored(id, requester_id).await?;

        if self.store.find_project_by_application(id).await?.is_some() {
            return Err(CoreError::rule(
                RULE_HAS_PROJECT,
                "Application cannot be deleted while a project exists",
            ));
        }

        let mut tx = self.store.begin().await?;
        if !tx.soft_delete_application(id).await? {
            return Err(CoreError::not_found("Application", id));
        }
        tx.commit().await?;

        tracing::info!(application_id = %id, "Application deleted");
        Ok(())
    }

    // -- helpers --

    async fn find_authored(
        &self,
        id: EntityId,
        requester_id: EntityId,
    ) -> Result<Application, CoreError> {
        let application = self.get(id).await?;
        if application.author_id != requester_id {
            return Err(CoreError::Authorization(
                "Only the author can modify this application".into(),
            ));
        }
        Ok(application)
    }

    /// Strict (zero-margin) bound check when a single project type is chosen.
    async fn check_creation_deadline(&self, fields: &ApplicationFields) -> Result<(), CoreError> {
        let [type_id] = fields.project_type_ids.as_slice() else {
            return Ok(());
        };
        let project_type = self
            .store
            .find_project_type(*type_id)
            .await?
            .ok_or_else(|| CoreError::not_found("ProjectType", *type_id))?;
        validate_deadline(fields.deadline, &project_type.duration_bounds(), 0, Utc::now())
    }
}
