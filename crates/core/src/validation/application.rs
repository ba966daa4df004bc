//! Application input validation.

use crate::entities::ApplicationFields;
use crate::error::CoreError;
use crate::validation::rules::{FieldChecker, RawInput};

pub const FIELD_TITLE: &str = "title";
pub const FIELD_SHORT_DESCRIPTION: &str = "short_description";
pub const FIELD_LONG_DESCRIPTION: &str = "long_description";
pub const FIELD_DEADLINE: &str = "deadline";
pub const FIELD_PROJECT_TYPE_IDS: &str = "project_type_ids";
pub const FIELD_FACULTY_IDS: &str = "faculty_ids";
pub const FIELD_PROBLEM_TYPE_IDS: &str = "problem_type_ids";
pub const FIELD_CUSTOM_PROBLEM_TYPE: &str = "custom_problem_type";

/// Validate a submitted or edited application.
pub fn validate_application(input: &RawInput) -> Result<ApplicationFields, CoreError> {
    let mut checker = FieldChecker::new();

    let title = checker.required_string(input, FIELD_TITLE);
    let short_description = checker.required_string(input, FIELD_SHORT_DESCRIPTION);
    let long_description = checker.required_string(input, FIELD_LONG_DESCRIPTION);
    let deadline = checker.required_date(input, FIELD_DEADLINE);
    let project_type_ids = dedup(checker.numeric_array(input, FIELD_PROJECT_TYPE_IDS));
    let faculty_ids = dedup(checker.numeric_array(input, FIELD_FACULTY_IDS));
    let problem_type_ids = dedup(checker.numeric_array(input, FIELD_PROBLEM_TYPE_IDS));
    let custom_problem_type = checker.optional_string(input, FIELD_CUSTOM_PROBLEM_TYPE);

    checker.finish()?;

    Ok(ApplicationFields {
        title,
        short_description,
        long_description,
        deadline,
        project_type_ids,
        faculty_ids,
        problem_type_ids,
        custom_problem_type,
    })
}

/// Drop repeated tag ids while keeping first-seen order.
fn dedup(ids: Vec<i64>) -> Vec<i64> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::validation::rules::{RULE_INVALID_CHARACTERS, RULE_INVALID_FORMAT, RULE_REQUIRED};

    fn raw(value: serde_json::Value) -> RawInput {
        value.as_object().cloned().unwrap()
    }

    fn valid_input() -> serde_json::Value {
        json!({
            "title": "  Soil moisture sensing  ",
            "short_description": "Low-cost sensors",
            "long_description": "A field study of low-cost soil sensors.",
            "deadline": "2027-06-30",
            "project_type_ids": [2],
            "faculty_ids": ["3", 3, 5],
            "problem_type_ids": 7,
            "custom_problem_type": "Irrigation"
        })
    }

    #[test]
    fn valid_application_is_normalized() {
        let fields = validate_application(&raw(valid_input())).unwrap();
        assert_eq!(fields.title, "Soil moisture sensing");
        assert_eq!(fields.project_type_ids, vec![2]);
        assert_eq!(fields.faculty_ids, vec![3, 5]);
        assert_eq!(fields.problem_type_ids, vec![7]);
        assert_eq!(fields.custom_problem_type.as_deref(), Some("Irrigation"));
        assert_eq!(fields.deadline.to_string(), "2027-06-30");
    }

    #[test]
    fn every_bad_field_is_reported() {
        let input = raw(json!({
            "title": "",
            "long_description": "ok",
            "deadline": "31/12/2027",
            "faculty_ids": ["1", "one"],
        }));

        let err = validate_application(&input).unwrap_err();
        assert_matches!(&err, CoreError::Validation { violations } if violations.len() == 4);

        let CoreError::Validation { violations } = err else { unreachable!() };
        let pairs: Vec<(&str, &str)> = violations
            .iter()
            .map(|v| (v.field.as_str(), v.rule.as_str()))
            .collect();
        assert!(pairs.contains(&("title", RULE_REQUIRED)));
        assert!(pairs.contains(&("short_description", RULE_REQUIRED)));
        assert!(pairs.contains(&("deadline", RULE_INVALID_FORMAT)));
        assert!(pairs.contains(&("faculty_ids[1]", RULE_INVALID_CHARACTERS)));
    }

    #[test]
    fn tag_lists_are_optional() {
        let mut input = valid_input();
        let obj = input.as_object_mut().unwrap();
        obj.remove("project_type_ids");
        obj.insert("faculty_ids".into(), json!(null));

        let fields = validate_application(&raw(input)).unwrap();
        assert!(fields.project_type_ids.is_empty());
        assert!(fields.faculty_ids.is_empty());
    }
}
