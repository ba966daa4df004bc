//! Domain error taxonomy.
//!
//! Every orchestrator operation fails with exactly one [`CoreError`] kind.
//! Infrastructure failures ([`StoreError`], [`FileStoreError`]) are translated
//! here so nothing storage-specific crosses the orchestrator boundary.

use serde::Serialize;

use crate::storage::FileStoreError;
use crate::store::StoreError;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A single offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub rule: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, rule: &str) -> Self {
        Self {
            field: field.into(),
            rule: rule.to_string(),
        }
    }
}

/// A single domain-rule violation (quota, duration bound, status guard).
///
/// `details` carries rule-specific context such as the role id, the counted
/// members or the boundary date, so callers can render actionable messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleViolation {
    pub rule: String,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl RuleViolation {
    pub fn new(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {}", summarize_fields(.violations))]
    Validation { violations: Vec<FieldViolation> },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Business rule violated: {message}")]
    BusinessRule {
        message: String,
        violations: Vec<RuleViolation>,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::Validation { violations }
    }

    /// A business-rule failure with a single violation.
    pub fn rule(rule: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::BusinessRule {
            violations: vec![RuleViolation::new(rule, message.clone())],
            message,
        }
    }

    pub fn rules(message: impl Into<String>, violations: Vec<RuleViolation>) -> Self {
        Self::BusinessRule {
            message: message.into(),
            violations,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Rule identifiers carried by a `Validation` or `BusinessRule` error.
    pub fn rule_names(&self) -> Vec<&str> {
        match self {
            Self::Validation { violations } => violations.iter().map(|v| v.rule.as_str()).collect(),
            Self::BusinessRule { violations, .. } => {
                violations.iter().map(|v| v.rule.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn summarize_fields(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} ({})", v.field, v.rule))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint } => {
                CoreError::Conflict(format!("Duplicate value violates unique constraint: {constraint}"))
            }
            StoreError::ForeignKeyViolation { constraint } => CoreError::rule(
                "missing_relation",
                format!("Referenced record does not exist ({constraint})"),
            ),
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Other(source) => CoreError::Internal {
                message: "Persistence failure".to_string(),
                source: Some(source),
            },
        }
    }
}

impl From<FileStoreError> for CoreError {
    fn from(err: FileStoreError) -> Self {
        CoreError::Internal {
            message: "File operation failed".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err: CoreError = StoreError::UniqueViolation {
            constraint: "uq_projects_application_id".into(),
        }
        .into();
        assert_matches!(err, CoreError::Conflict(msg) if msg.contains("uq_projects_application_id"));
    }

    #[test]
    fn foreign_key_violation_maps_to_business_rule() {
        let err: CoreError = StoreError::ForeignKeyViolation {
            constraint: "fk_team_members_role_id".into(),
        }
        .into();
        assert_eq!(err.rule_names(), vec!["missing_relation"]);
    }

    #[test]
    fn store_not_found_keeps_entity() {
        let err: CoreError = StoreError::NotFound {
            entity: "Project",
            id: "abc".into(),
        }
        .into();
        assert_matches!(err, CoreError::NotFound { entity: "Project", .. });
    }

    #[test]
    fn generic_store_failure_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "connection reset");
        let err: CoreError = StoreError::Other(Box::new(io)).into();
        let source = std::error::Error::source(&err).expect("cause attached");
        assert!(source.to_string().contains("connection reset"));
    }

    #[test]
    fn file_store_failure_maps_to_internal() {
        let err: CoreError = FileStoreError::Io(std::io::Error::other("disk full")).into();
        assert_matches!(err, CoreError::Internal { source: Some(_), .. });
    }

    #[test]
    fn validation_message_lists_every_field() {
        let err = CoreError::validation(vec![
            FieldViolation::new("title", "required"),
            FieldViolation::new("deadline", "invalid_format"),
        ]);
        let text = err.to_string();
        assert!(text.contains("title (required)"));
        assert!(text.contains("deadline (invalid_format)"));
    }
}
