//! File descriptor validation.
//!
//! The `(model_target, purpose)` pair is normally checked upstream; this
//! validator still refuses unregistered pairs before any bytes are stored.

use crate::error::{CoreError, FieldViolation};
use crate::resource::{cardinality_of, FileDescriptor, FilePurpose, ModelTarget};
use crate::validation::rules::{
    FieldChecker, RawInput, RULE_INVALID_VALUE, RULE_UNREGISTERED_COMBINATION,
};

pub fn validate_file_descriptor(input: &RawInput) -> Result<FileDescriptor, CoreError> {
    let mut checker = FieldChecker::new();

    let name = checker.required_string(input, "name");
    let target_name = checker.required_string(input, "model_target");
    let purpose_name = checker.required_string(input, "purpose");
    let is_default = checker.optional_bool(input, "is_default", false);

    let model_target = ModelTarget::from_name(&target_name);
    if model_target.is_none() && !target_name.is_empty() {
        checker.push("model_target", RULE_INVALID_VALUE);
    }
    let purpose = FilePurpose::from_name(&purpose_name);
    if purpose.is_none() && !purpose_name.is_empty() {
        checker.push("purpose", RULE_INVALID_VALUE);
    }

    checker.finish()?;

    let (Some(model_target), Some(purpose)) = (model_target, purpose) else {
        return Err(CoreError::internal("file descriptor enums missing after validation"));
    };

    let cardinality = cardinality_of(model_target, purpose).ok_or_else(|| {
        CoreError::validation(vec![FieldViolation::new(
            "purpose",
            RULE_UNREGISTERED_COMBINATION,
        )])
    })?;

    Ok(FileDescriptor {
        name,
        model_target,
        purpose,
        cardinality,
        is_default,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resource::Cardinality;

    #[test]
    fn registered_combination_passes() {
        let input = json!({ "name": "cover.png", "model_target": "project", "purpose": "cover" });
        let descriptor = validate_file_descriptor(input.as_object().unwrap()).unwrap();
        assert_eq!(descriptor.cardinality, Cardinality::One);
        assert!(!descriptor.is_default);
    }

    #[test]
    fn unregistered_combination_fails_fast() {
        let input = json!({ "name": "a.png", "model_target": "user", "purpose": "deliverable" });
        let err = validate_file_descriptor(input.as_object().unwrap()).unwrap_err();
        assert_eq!(err.rule_names(), vec![RULE_UNREGISTERED_COMBINATION]);
    }

    #[test]
    fn unknown_enum_values_are_reported_together() {
        let input = json!({ "name": "", "model_target": "team", "purpose": "selfie" });
        let err = validate_file_descriptor(input.as_object().unwrap()).unwrap_err();
        assert_eq!(
            err.rule_names(),
            vec!["required", RULE_INVALID_VALUE, RULE_INVALID_VALUE]
        );
    }

    #[test]
    fn default_flag_is_read() {
        let input = json!({
            "name": "placeholder.png",
            "model_target": "user",
            "purpose": "avatar",
            "is_default": true
        });
        assert!(validate_file_descriptor(input.as_object().unwrap()).unwrap().is_default);
    }
}
