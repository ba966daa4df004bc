//! Approval input validation (the request that creates a project).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, EntityId};
use crate::validation::rules::{FieldChecker, RawInput};

/// Normalized approve request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub application_id: EntityId,
    pub project_type_id: DbId,
    pub advisor_user_id: EntityId,
}

pub fn validate_approval(input: &RawInput) -> Result<ApprovalRequest, CoreError> {
    let mut checker = FieldChecker::new();

    let application_id = checker.required_id(input, "application_id");
    let project_type_id = checker.required_number(input, "project_type_id");
    let advisor_user_id = checker.required_id(input, "advisor_user_id");

    checker.finish()?;

    Ok(ApprovalRequest {
        application_id,
        project_type_id,
        advisor_user_id,
    })
}
