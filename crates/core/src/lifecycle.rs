//! Application → Project state machine.
//!
//! ```text
//!   Application            Project
//!   in_review  --approve-->  project_approved  --start-->  project_in_progress
//!       ^                        |                               |
//!       +--------rollback--------+-------------------------------+
//! ```
//!
//! Every transition that writes more than one row runs in a single store
//! transaction; an early return drops the transaction and rolls it back.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::deadline::{deadline_violations, validate_deadline, DEFAULT_MARGIN_DAYS};
use crate::entities::{Application, NewProject, NewTeamMember, Project, ProjectType, TeamMember};
use crate::error::CoreError;
use crate::roles::advisor_role_for;
use crate::status::{ApplicationStatus, ProjectStatus};
use crate::store::{Store, StoreTx};
use crate::team_composition::team_composition_violations;
use crate::types::{Date, EntityId};
use crate::validation::project::ApprovalRequest;
use crate::validation::rules::parse_deadline_value;

pub const RULE_INVALID_TRANSITION: &str = "invalid_status_transition";
pub const RULE_PROJECT_TYPE_REQUIRED: &str = "project_type_required";
pub const RULE_MISSING_ROLE: &str = "missing_role";

/// Tunables for the lifecycle checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Tolerance applied to duration bounds at start and on deadline updates.
    pub deadline_margin_days: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            deadline_margin_days: DEFAULT_MARGIN_DAYS,
        }
    }
}

/// Result of approving an application.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub project: Project,
    pub advisor: TeamMember,
    pub application: Application,
}

/// Result of rolling a project back.
#[derive(Debug, Clone, Serialize)]
pub struct RollbackOutcome {
    pub project_id: EntityId,
    pub application_id: EntityId,
    pub removed_members: u64,
}

pub struct LifecycleOrchestrator<S: Store> {
    store: Arc<S>,
    config: LifecycleConfig,
}

impl<S: Store> LifecycleOrchestrator<S> {
    pub fn new(store: Arc<S>, config: LifecycleConfig) -> Self {
        Self { store, config }
    }

    /// Approve an in-review application into a project and seed its advisor.
    pub async fn approve(
        &self,
        request: &ApprovalRequest,
        reviewer_id: EntityId,
    ) -> Result<ApprovalOutcome, CoreError> {
        let application_id = request.application_id;

        let mut application = self
            .store
            .find_application(application_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Application", application_id))?;

        if self
            .store
            .find_project_by_application(application_id)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(format!(
                "Application {application_id} already has a project"
            )));
        }

        if application.status != ApplicationStatus::InReview {
            return Err(CoreError::rule(
                RULE_INVALID_TRANSITION,
                format!(
                    "Only applications in review can be approved (current status: {})",
                    application.status
                ),
            ));
        }

        let project_type = self
            .store
            .find_project_type(request.project_type_id)
            .await?
            .ok_or_else(|| CoreError::not_found("ProjectType", request.project_type_id))?;

        if !self.store.user_exists(request.advisor_user_id).await? {
            return Err(CoreError::not_found("User", request.advisor_user_id));
        }

        let role_name = advisor_role_for(&project_type.constraints);
        let role = self
            .store
            .find_role_by_name(role_name)
            .await?
            .ok_or_else(|| {
                CoreError::rule(
                    RULE_MISSING_ROLE,
                    format!("Role '{role_name}' does not exist in the role catalog"),
                )
            })?;

        let mut tx = self.store.begin().await?;

        let project = tx
            .insert_project(&NewProject {
                application_id,
                creator_id: request.advisor_user_id,
            })
            .await?;

        let advisor = tx
            .insert_team_member(&NewTeamMember {
                project_id: project.id,
                user_id: request.advisor_user_id,
                role_id: role.id,
            })
            .await?;

        tx.set_application_project_types(application_id, &[project_type.id])
            .await?;

        if !tx
            .set_application_status(application_id, ApplicationStatus::Approved)
            .await?
        {
            return Err(CoreError::not_found("Application", application_id));
        }

        tx.commit().await?;

        application.status = ApplicationStatus::Approved;
        application.project_type_ids = vec![project_type.id];

        tracing::info!(
            %application_id,
            project_id = %project.id,
            advisor_id = %request.advisor_user_id,
            %reviewer_id,
            role = role_name,
            "Application approved into project",
        );

        Ok(ApprovalOutcome {
            project,
            advisor,
            application,
        })
    }

    /// Move an approved project into execution once its team and deadline
    /// satisfy the project type.
    pub async fn start(
        &self,
        project_id: EntityId,
        requester_id: EntityId,
    ) -> Result<Project, CoreError> {
        let mut project = self.find_owned_project(project_id, requester_id).await?;

        if project.status != ProjectStatus::ProjectApproved {
            return Err(CoreError::rule(
                RULE_INVALID_TRANSITION,
                format!("Project cannot start from status {}", project.status),
            ));
        }

        let application = self.find_application(project.application_id).await?;
        let project_type = self.single_project_type(&application).await?;

        let role_ids: Vec<_> = self
            .store
            .list_team_members(project_id)
            .await?
            .iter()
            .map(|m| m.role_id)
            .collect();

        let mut violations = team_composition_violations(&role_ids, &project_type.constraints);
        violations.extend(deadline_violations(
            application.deadline,
            &project_type.duration_bounds(),
            self.config.deadline_margin_days,
            Utc::now(),
        ));

        if !violations.is_empty() {
            tracing::debug!(
                %project_id,
                violation_count = violations.len(),
                "Project start rejected",
            );
            return Err(CoreError::rules(
                "Project does not satisfy its project type requirements",
                violations,
            ));
        }

        let mut tx = self.store.begin().await?;
        let moved = tx
            .transition_project_status(
                project_id,
                ProjectStatus::ProjectApproved,
                ProjectStatus::ProjectInProgress,
            )
            .await?;
        if !moved {
            return Err(CoreError::Conflict(format!(
                "Project {project_id} changed status while starting"
            )));
        }
        tx.commit().await?;

        project.status = ProjectStatus::ProjectInProgress;
        project.updated_at = Utc::now();

        tracing::info!(%project_id, requester_id = %requester_id, "Project started");

        Ok(project)
    }

    /// Delete a project and return its application to review.
    ///
    /// Allowed from either project status.
    pub async fn rollback(
        &self,
        project_id: EntityId,
        requester_id: EntityId,
    ) -> Result<RollbackOutcome, CoreError> {
        let project = self.find_owned_project(project_id, requester_id).await?;

        let mut tx = self.store.begin().await?;

        if !tx
            .set_application_status(project.application_id, ApplicationStatus::InReview)
            .await?
        {
            return Err(CoreError::not_found("Application", project.application_id));
        }

        let removed_members = tx.delete_team_members(project_id).await?;

        if !tx.delete_project(project_id).await? {
            return Err(CoreError::not_found("Project", project_id));
        }

        tx.commit().await?;

        tracing::info!(
            %project_id,
            application_id = %project.application_id,
            removed_members,
            status_before = %project.status,
            "Project rolled back",
        );

        Ok(RollbackOutcome {
            project_id,
            application_id: project.application_id,
            removed_members,
        })
    }

    /// Change the deadline of a project's application after re-checking it
    /// against the project type's duration bounds.
    pub async fn update_deadline(
        &self,
        project_id: EntityId,
        raw_deadline: &serde_json::Value,
        requester_id: EntityId,
    ) -> Result<Application, CoreError> {
        let deadline: Date = parse_deadline_value(raw_deadline)?;

        let project = self.find_owned_project(project_id, requester_id).await?;
        let mut application = self.find_application(project.application_id).await?;
        let project_type = self.single_project_type(&application).await?;

        validate_deadline(
            deadline,
            &project_type.duration_bounds(),
            self.config.deadline_margin_days,
            Utc::now(),
        )?;

        let mut tx = self.store.begin().await?;
        if !tx.set_application_deadline(application.id, deadline).await? {
            return Err(CoreError::not_found("Application", application.id));
        }
        tx.commit().await?;

        tracing::info!(%project_id, %deadline, "Project deadline updated");

        application.deadline = deadline;
        Ok(application)
    }

    pub async fn get_project(&self, project_id: EntityId) -> Result<Project, CoreError> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project", project_id))
    }

    // -- helpers --

    async fn find_owned_project(
        &self,
        project_id: EntityId,
        requester_id: EntityId,
    ) -> Result<Project, CoreError> {
        let project = self.get_project(project_id).await?;
        if project.creator_id != requester_id {
            return Err(CoreError::Authorization(
                "Only the project creator can perform this action".into(),
            ));
        }
        Ok(project)
    }

    async fn find_application(&self, id: EntityId) -> Result<Application, CoreError> {
        self.store
            .find_application(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Application", id))
    }

    async fn single_project_type(
        &self,
        application: &Application,
    ) -> Result<ProjectType, CoreError> {
        let type_id = application.single_project_type().ok_or_else(|| {
            CoreError::rule(
                RULE_PROJECT_TYPE_REQUIRED,
                "Application must carry exactly one project type",
            )
        })?;
        self.store
            .find_project_type(type_id)
            .await?
            .ok_or_else(|| CoreError::not_found("ProjectType", type_id))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::deadline::RULE_MIN_DURATION;
    use crate::entities::{ApplicationFields, RoleConstraint};
    use crate::roles::{ROLE_ADVISOR, ROLE_RESEARCHER, ROLE_STUDENT};
    use crate::team_composition::RULE_MIN_COUNT_NOT_MET;
    use crate::testing::InMemoryStore;
    use crate::types::DbId;

    const PROJECT_TYPE_ID: DbId = 10;
    const REVIEWER: EntityId = EntityId::nil();

    struct Fixture {
        store: Arc<InMemoryStore>,
        lifecycle: LifecycleOrchestrator<InMemoryStore>,
        advisor_role: DbId,
        student_role: DbId,
        advisor_id: EntityId,
    }

    fn fixture(min_months: Option<i32>, min_students: i32) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let advisor_role = store.seed_role(ROLE_ADVISOR).id;
        let student_role = store.seed_role(ROLE_STUDENT).id;
        store.seed_project_type(ProjectType {
            id: PROJECT_TYPE_ID,
            name: "Capstone".into(),
            min_estimated_months: min_months,
            max_estimated_months: None,
            required_hours: 120,
            constraints: vec![
                RoleConstraint {
                    role_id: advisor_role,
                    role_name: ROLE_ADVISOR.into(),
                    min_count: 1,
                    max_count: Some(1),
                },
                RoleConstraint {
                    role_id: student_role,
                    role_name: ROLE_STUDENT.into(),
                    min_count: min_students,
                    max_count: Some(4),
                },
            ],
        });
        let advisor_id = store.seed_user();
        let lifecycle = LifecycleOrchestrator::new(Arc::clone(&store), LifecycleConfig::default());
        Fixture {
            store,
            lifecycle,
            advisor_role,
            student_role,
            advisor_id,
        }
    }

    fn fields(deadline_days: i64) -> ApplicationFields {
        ApplicationFields {
            title: "Water quality monitor".into(),
            short_description: "Sensors".into(),
            long_description: "River sensor network".into(),
            deadline: (Utc::now() + Duration::days(deadline_days)).date_naive(),
            project_type_ids: vec![],
            faculty_ids: vec![1],
            problem_type_ids: vec![],
            custom_problem_type: None,
        }
    }

    fn approval(f: &Fixture, application_id: EntityId) -> ApprovalRequest {
        ApprovalRequest {
            application_id,
            project_type_id: PROJECT_TYPE_ID,
            advisor_user_id: f.advisor_id,
        }
    }

    async fn approved_project(f: &Fixture, deadline_days: i64) -> Project {
        let author = f.store.seed_user();
        let app = f.store.seed_application(author, fields(deadline_days));
        f.lifecycle.approve(&approval(f, app.id), REVIEWER).await.unwrap().project
    }

    async fn add_students(f: &Fixture, project_id: EntityId, n: usize) {
        for _ in 0..n {
            // seed before begin: a transaction only sees state from when it opened
            let user_id = f.store.seed_user();
            let mut tx = f.store.begin().await.unwrap();
            tx.insert_team_member(&NewTeamMember {
                project_id,
                user_id,
                role_id: f.student_role,
            })
            .await
            .unwrap();
            tx.commit().await.unwrap();
        }
    }

    #[tokio::test]
    async fn approve_creates_project_and_advisor_atomically() {
        let f = fixture(None, 0);
        let author = f.store.seed_user();
        let app = f.store.seed_application(author, fields(400));

        let outcome = f.lifecycle.approve(&approval(&f, app.id), REVIEWER).await.unwrap();

        assert_eq!(outcome.project.application_id, app.id);
        assert_eq!(outcome.project.creator_id, f.advisor_id);
        assert_eq!(outcome.project.status, ProjectStatus::ProjectApproved);
        assert_eq!(outcome.advisor.role_id, f.advisor_role);

        let stored = f.store.application(app.id).unwrap();
        assert_eq!(stored.status, ApplicationStatus::Approved);
        assert_eq!(stored.project_type_ids, vec![PROJECT_TYPE_ID]);
        assert_eq!(f.store.team_members(outcome.project.id).len(), 1);
    }

    #[tokio::test]
    async fn approve_prefers_researcher_role() {
        let f = fixture(None, 0);
        let researcher = f.store.seed_role(ROLE_RESEARCHER);
        f.store.seed_project_type(ProjectType {
            id: 11,
            name: "Research".into(),
            min_estimated_months: None,
            max_estimated_months: None,
            required_hours: 0,
            constraints: vec![RoleConstraint {
                role_id: researcher.id,
                role_name: ROLE_RESEARCHER.into(),
                min_count: 1,
                max_count: None,
            }],
        });
        let app = f.store.seed_application(f.store.seed_user(), fields(400));

        let outcome = f
            .lifecycle
            .approve(
                &ApprovalRequest {
                    project_type_id: 11,
                    ..approval(&f, app.id)
                },
                REVIEWER,
            )
            .await
            .unwrap();
        assert_eq!(outcome.advisor.role_id, researcher.id);
    }

    #[tokio::test]
    async fn approve_twice_conflicts() {
        let f = fixture(None, 0);
        let app = f.store.seed_application(f.store.seed_user(), fields(400));
        f.lifecycle.approve(&approval(&f, app.id), REVIEWER).await.unwrap();

        let err = f.lifecycle.approve(&approval(&f, app.id), REVIEWER).await.unwrap_err();
        assert_matches!(err, CoreError::Conflict(_));
        assert_eq!(f.store.projects().len(), 1);
    }

    #[tokio::test]
    async fn approve_missing_references_are_not_found() {
        let f = fixture(None, 0);
        let app = f.store.seed_application(f.store.seed_user(), fields(400));

        let err = f
            .lifecycle
            .approve(
                &ApprovalRequest {
                    project_type_id: 999,
                    ..approval(&f, app.id)
                },
                REVIEWER,
            )
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "ProjectType", .. });

        let err = f
            .lifecycle
            .approve(
                &ApprovalRequest {
                    advisor_user_id: EntityId::new_v4(),
                    ..approval(&f, app.id)
                },
                REVIEWER,
            )
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "User", .. });
        assert!(f.store.projects().is_empty());
    }

    #[tokio::test]
    async fn approve_without_role_in_catalog_is_business_rule() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_project_type(ProjectType {
            id: PROJECT_TYPE_ID,
            name: "Bare".into(),
            min_estimated_months: None,
            max_estimated_months: None,
            required_hours: 0,
            constraints: vec![],
        });
        let advisor = store.seed_user();
        let app = store.seed_application(store.seed_user(), fields(400));
        let lifecycle = LifecycleOrchestrator::new(Arc::clone(&store), LifecycleConfig::default());

        let err = lifecycle
            .approve(
                &ApprovalRequest {
                    application_id: app.id,
                    project_type_id: PROJECT_TYPE_ID,
                    advisor_user_id: advisor,
                },
                REVIEWER,
            )
            .await
            .unwrap_err();
        assert_eq!(err.rule_names(), vec![RULE_MISSING_ROLE]);
    }

    #[tokio::test]
    async fn failed_write_inside_approve_leaves_no_rows() {
        let f = fixture(None, 0);
        let app = f.store.seed_application(f.store.seed_user(), fields(400));
        f.store.fail_on_write(3);

        let err = f.lifecycle.approve(&approval(&f, app.id), REVIEWER).await.unwrap_err();
        assert_matches!(err, CoreError::Internal { .. });
        assert!(f.store.projects().is_empty());
        assert!(f.store.all_team_members().is_empty());
        assert_eq!(
            f.store.application(app.id).unwrap().status,
            ApplicationStatus::InReview
        );
    }

    #[tokio::test]
    async fn start_requires_creator() {
        let f = fixture(None, 0);
        let project = approved_project(&f, 400).await;
        let err = f
            .lifecycle
            .start(project.id, EntityId::new_v4())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Authorization(_));
    }

    #[tokio::test]
    async fn start_moves_valid_project_in_progress() {
        let f = fixture(Some(6), 2);
        let project = approved_project(&f, 365).await;
        add_students(&f, project.id, 2).await;

        let started = f.lifecycle.start(project.id, f.advisor_id).await.unwrap();
        assert_eq!(started.status, ProjectStatus::ProjectInProgress);

        let err = f.lifecycle.start(project.id, f.advisor_id).await.unwrap_err();
        assert_eq!(err.rule_names(), vec![RULE_INVALID_TRANSITION]);
    }

    #[tokio::test]
    async fn start_losing_status_race_conflicts() {
        let f = fixture(None, 0);
        let project = approved_project(&f, 400).await;
        let project_id = project.id;
        f.store.interleave_before_next_begin(move |store| {
            store.force_project_status(project_id, ProjectStatus::ProjectInProgress);
        });

        let err = f.lifecycle.start(project_id, f.advisor_id).await.unwrap_err();
        assert_matches!(err, CoreError::Conflict(_));
        assert_eq!(
            f.lifecycle.get_project(project_id).await.unwrap().status,
            ProjectStatus::ProjectInProgress
        );
    }

    #[tokio::test]
    async fn rollback_losing_delete_race_is_not_found() {
        let f = fixture(None, 0);
        let project = approved_project(&f, 400).await;
        let project_id = project.id;
        f.store.interleave_before_next_begin(move |store| {
            store.force_delete_project(project_id);
        });

        let err = f.lifecycle.rollback(project_id, f.advisor_id).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "Project", .. });
        assert!(f.store.projects().is_empty());
        assert_eq!(
            f.store.application(project.application_id).unwrap().status,
            ApplicationStatus::Approved
        );
    }

    #[tokio::test]
    async fn start_with_deadline_too_soon_fails_and_keeps_status() {
        let f = fixture(Some(6), 0);
        let project = approved_project(&f, 5).await;

        let err = f.lifecycle.start(project.id, f.advisor_id).await.unwrap_err();
        assert_eq!(err.rule_names(), vec![RULE_MIN_DURATION]);

        let current = f.lifecycle.get_project(project.id).await.unwrap();
        assert_eq!(current.status, ProjectStatus::ProjectApproved);
    }

    #[tokio::test]
    async fn start_reports_team_and_deadline_violations_together() {
        let f = fixture(Some(6), 2);
        let project = approved_project(&f, 5).await;

        let err = f.lifecycle.start(project.id, f.advisor_id).await.unwrap_err();
        assert_eq!(
            err.rule_names(),
            vec![RULE_MIN_COUNT_NOT_MET, RULE_MIN_DURATION]
        );
    }

    #[tokio::test]
    async fn rollback_removes_project_and_members_for_any_team_size() {
        for n in [0, 1, 4] {
            let f = fixture(None, 0);
            let project = approved_project(&f, 400).await;
            add_students(&f, project.id, n).await;

            let outcome = f.lifecycle.rollback(project.id, f.advisor_id).await.unwrap();
            assert_eq!(outcome.removed_members, n as u64 + 1);

            assert!(f.store.projects().is_empty());
            assert!(f.store.all_team_members().is_empty());
            assert_eq!(
                f.store.application(outcome.application_id).unwrap().status,
                ApplicationStatus::InReview
            );
        }
    }

    #[tokio::test]
    async fn rollback_allows_reapproval() {
        let f = fixture(None, 0);
        let project = approved_project(&f, 400).await;
        let outcome = f.lifecycle.rollback(project.id, f.advisor_id).await.unwrap();

        let again = f
            .lifecycle
            .approve(&approval(&f, outcome.application_id), REVIEWER)
            .await
            .unwrap();
        assert_ne!(again.project.id, project.id);
    }

    #[tokio::test]
    async fn rollback_by_stranger_is_rejected() {
        let f = fixture(None, 0);
        let project = approved_project(&f, 400).await;
        let err = f
            .lifecycle
            .rollback(project.id, EntityId::new_v4())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Authorization(_));
        assert_eq!(f.store.projects().len(), 1);
    }

    #[tokio::test]
    async fn update_deadline_validates_before_writing() {
        let f = fixture(Some(6), 0);
        let project = approved_project(&f, 365).await;

        let err = f
            .lifecycle
            .update_deadline(project.id, &json!("not a date"), f.advisor_id)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });

        let too_soon = (Utc::now() + Duration::days(10)).date_naive();
        let err = f
            .lifecycle
            .update_deadline(project.id, &json!(too_soon.to_string()), f.advisor_id)
            .await
            .unwrap_err();
        assert_eq!(err.rule_names(), vec![RULE_MIN_DURATION]);

        let later = (Utc::now() + Duration::days(300)).date_naive();
        let app = f
            .lifecycle
            .update_deadline(project.id, &json!(later.to_string()), f.advisor_id)
            .await
            .unwrap();
        assert_eq!(app.deadline, later);
        assert_eq!(f.store.application(app.id).unwrap().deadline, later);

        let current = f.lifecycle.get_project(project.id).await.unwrap();
        assert_eq!(current.status, ProjectStatus::ProjectApproved);
    }
}
