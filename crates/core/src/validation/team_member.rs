//! Team member input validation.

use serde_json::Value;

use crate::entities::NewTeamMember;
use crate::error::CoreError;
use crate::types::DbId;
use crate::validation::rules::{FieldChecker, RawInput, RULE_INVALID_VALUE, RULE_REQUIRED};

/// Validate a single member: `project_id`, `user_id`, `role_id`.
pub fn validate_team_member(input: &RawInput) -> Result<NewTeamMember, CoreError> {
    let mut checker = FieldChecker::new();
    let member = read_member(&mut checker, input, None);
    checker.finish()?;
    Ok(member)
}

/// Validate a bulk team payload: `project_id` plus a `members` array of
/// `{user_id, role_id}` objects. Duplicates are kept; the caller drops them.
pub fn validate_team_batch(input: &RawInput) -> Result<Vec<NewTeamMember>, CoreError> {
    let mut checker = FieldChecker::new();
    let project_id = checker.required_id(input, "project_id");

    let mut members = Vec::new();
    match input.get("members") {
        Some(Value::Array(items)) if !items.is_empty() => {
            for (index, item) in items.iter().enumerate() {
                let mut item_checker = FieldChecker::with_prefix(format!("members[{index}]."));
                match item.as_object() {
                    Some(obj) => {
                        members.push(read_member(&mut item_checker, obj, Some(project_id)));
                    }
                    None => item_checker.push("", RULE_INVALID_VALUE),
                }
                checker.absorb(item_checker);
            }
        }
        Some(Value::Array(_)) | Some(Value::Null) | None => checker.push("members", RULE_REQUIRED),
        Some(_) => checker.push("members", RULE_INVALID_VALUE),
    }

    checker.finish()?;
    Ok(members)
}

/// Validate a role change payload: `role_id`.
pub fn validate_role_change(input: &RawInput) -> Result<DbId, CoreError> {
    let mut checker = FieldChecker::new();
    let role_id = checker.required_number(input, "role_id");
    checker.finish()?;
    Ok(role_id)
}

fn read_member(
    checker: &mut FieldChecker,
    input: &RawInput,
    project_id: Option<crate::types::EntityId>,
) -> NewTeamMember {
    let project_id = match project_id {
        Some(id) => id,
        None => checker.required_id(input, "project_id"),
    };
    let user_id = checker.required_id(input, "user_id");
    let role_id = checker.required_number(input, "role_id");
    NewTeamMember {
        project_id,
        user_id,
        role_id,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::EntityId;

    #[test]
    fn single_member_parses() {
        let project = EntityId::new_v4();
        let user = EntityId::new_v4();
        let input = json!({
            "project_id": project.to_string(),
            "user_id": user.to_string(),
            "role_id": 4,
        });
        let member = validate_team_member(input.as_object().unwrap()).unwrap();
        assert_eq!(
            member,
            NewTeamMember {
                project_id: project,
                user_id: user,
                role_id: 4
            }
        );
    }

    #[test]
    fn role_id_must_be_numeric() {
        let input = json!({
            "project_id": EntityId::new_v4().to_string(),
            "user_id": EntityId::new_v4().to_string(),
            "role_id": "lead",
        });
        let err = validate_team_member(input.as_object().unwrap()).unwrap_err();
        assert_eq!(err.rule_names(), vec!["invalid_characters"]);
    }

    #[test]
    fn batch_reports_indexed_fields() {
        let input = json!({
            "project_id": EntityId::new_v4().to_string(),
            "members": [
                { "user_id": EntityId::new_v4().to_string(), "role_id": 1 },
                { "user_id": "", "role_id": 1 },
                "not an object",
            ],
        });
        let err = validate_team_batch(input.as_object().unwrap()).unwrap_err();
        let CoreError::Validation { violations } = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["members[1].user_id", "members[2]."]);
    }

    #[test]
    fn batch_keeps_duplicates_for_caller() {
        let user = EntityId::new_v4().to_string();
        let input = json!({
            "project_id": EntityId::new_v4().to_string(),
            "members": [
                { "user_id": user, "role_id": 1 },
                { "user_id": user, "role_id": 2 },
            ],
        });
        let members = validate_team_batch(input.as_object().unwrap()).unwrap();
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn empty_batch_is_required() {
        let input = json!({ "project_id": EntityId::new_v4().to_string(), "members": [] });
        let err = validate_team_batch(input.as_object().unwrap()).unwrap_err();
        assert_eq!(err.rule_names(), vec!["required"]);
    }
}
