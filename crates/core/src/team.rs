//! Team membership management for a project.
//!
//! Only the project creator mutates the team. Quotas are not enforced per
//! mutation; they are checked as a whole when the project starts.

use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::{NewTeamMember, Project, TeamMember};
use crate::error::CoreError;
use crate::store::{Store, StoreTx};
use crate::types::EntityId;
use crate::validation::{validate_role_change, validate_team_batch, validate_team_member, RawInput};

pub const RULE_CREATOR_REQUIRED: &str = "creator_must_remain";

pub struct TeamService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> TeamService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(&self, project_id: EntityId) -> Result<Vec<TeamMember>, CoreError> {
        self.find_project(project_id).await?;
        Ok(self.store.list_team_members(project_id).await?)
    }

    pub async fn add_member(
        &self,
        requester_id: EntityId,
        input: &RawInput,
    ) -> Result<TeamMember, CoreError> {
        let member = validate_team_member(input)?;
        self.find_owned_project(member.project_id, requester_id).await?;

        if !self.store.user_exists(member.user_id).await? {
            return Err(CoreError::not_found("User", member.user_id));
        }

        let mut tx = self.store.begin().await?;
        let created = tx.insert_team_member(&member).await?;
        tx.commit().await?;

        tracing::info!(
            project_id = %created.project_id,
            user_id = %created.user_id,
            role_id = created.role_id,
            "Team member added",
        );
        Ok(created)
    }

    /// Insert a batch of members. Repeated users in the batch and users
    /// already on the team are skipped; only new rows are returned.
    pub async fn create_team(
        &self,
        requester_id: EntityId,
        input: &RawInput,
    ) -> Result<Vec<TeamMember>, CoreError> {
        let requested = validate_team_batch(input)?;
        let Some(project_id) = requested.first().map(|m| m.project_id) else {
            return Ok(Vec::new());
        };
        self.find_owned_project(project_id, requester_id).await?;

        let members = unique_members(requested);

        let mut tx = self.store.begin().await?;
        let created = tx.insert_team_members_skip_duplicates(&members).await?;
        tx.commit().await?;

        tracing::info!(
            %project_id,
            requested = members.len(),
            inserted = created.len(),
            "Team created",
        );
        Ok(created)
    }

    pub async fn change_role(
        &self,
        project_id: EntityId,
        user_id: EntityId,
        requester_id: EntityId,
        input: &RawInput,
    ) -> Result<TeamMember, CoreError> {
        let role_id = validate_role_change(input)?;
        self.find_owned_project(project_id, requester_id).await?;

        let mut tx = self.store.begin().await?;
        let updated = tx
            .update_team_member_role(project_id, user_id, role_id)
            .await?
            .ok_or_else(|| CoreError::not_found("TeamMember", user_id))?;
        tx.commit().await?;

        tracing::info!(%project_id, %user_id, role_id, "Team member role changed");
        Ok(updated)
    }

    pub async fn remove_member(
        &self,
        project_id: EntityId,
        user_id: EntityId,
        requester_id: EntityId,
    ) -> Result<(), CoreError> {
        let project = self.find_owned_project(project_id, requester_id).await?;
        if project.creator_id == user_id {
            return Err(CoreError::rule(
                RULE_CREATOR_REQUIRED,
                "The project creator cannot be removed from the team",
            ));
        }

        let mut tx = self.store.begin().await?;
        if !tx.delete_team_member(project_id, user_id).await? {
            return Err(CoreError::not_found("TeamMember", user_id));
        }
        tx.commit().await?;

        tracing::info!(%project_id, %user_id, "Team member removed");
        Ok(())
    }

    async fn find_project(&self, project_id: EntityId) -> Result<Project, CoreError> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project", project_id))
    }

    async fn find_owned_project(
        &self,
        project_id: EntityId,
        requester_id: EntityId,
    ) -> Result<Project, CoreError> {
        let project = self.find_project(project_id).await?;
        if project.creator_id != requester_id {
            return Err(CoreError::Authorization(
                "Only the project creator can manage the team".into(),
            ));
        }
        Ok(project)
    }
}

/// First occurrence of each `(project_id, user_id)` pair wins.
fn unique_members(members: Vec<NewTeamMember>) -> Vec<NewTeamMember> {
    let mut seen = HashSet::with_capacity(members.len());
    members
        .into_iter()
        .filter(|m| seen.insert((m.project_id, m.user_id)))
        .collect()
}
