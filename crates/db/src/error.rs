//! Translation of `sqlx` failures into [`StoreError`].
//!
//! Constraint names are the ones declared in `migrations/`; the core maps
//! them to conflict and missing-relation errors.

use propel_core::store::StoreError;

/// PostgreSQL SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for `foreign_key_violation`.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// A persisted column held a value the domain does not recognise.
#[derive(Debug, thiserror::Error)]
#[error("column {column} holds unknown value {value:?}")]
pub struct DecodeError {
    pub column: &'static str,
    pub value: String,
}

/// Classify a database error by SQLSTATE and constraint name.
pub fn classify_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = db_err.code();
        if let Some(classified) = classify_parts(code.as_deref(), db_err.constraint()) {
            return classified;
        }
    }
    StoreError::Other(Box::new(err))
}

/// Pure classification on the parts of a database error.
pub fn classify_parts(code: Option<&str>, constraint: Option<&str>) -> Option<StoreError> {
    let constraint = constraint.unwrap_or_default().to_string();
    match code? {
        UNIQUE_VIOLATION => Some(StoreError::UniqueViolation { constraint }),
        FOREIGN_KEY_VIOLATION => Some(StoreError::ForeignKeyViolation { constraint }),
        _ => None,
    }
}

/// Wrap an unknown enum column value.
pub fn decode_error(column: &'static str, value: &str) -> StoreError {
    StoreError::Other(Box::new(DecodeError {
        column,
        value: value.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn unique_violation_keeps_constraint_name() {
        let err = classify_parts(Some("23505"), Some("uq_projects_application_id"));
        assert_matches!(
            err,
            Some(StoreError::UniqueViolation { ref constraint }) if constraint == "uq_projects_application_id"
        );
    }

    #[test]
    fn foreign_key_violation_classified() {
        let err = classify_parts(Some("23503"), Some("fk_team_members_user_id"));
        assert_matches!(err, Some(StoreError::ForeignKeyViolation { .. }));
    }

    #[test]
    fn other_codes_are_not_classified() {
        assert!(classify_parts(Some("40001"), None).is_none());
        assert!(classify_parts(None, Some("uq_roles_name")).is_none());
    }

    #[test]
    fn row_not_found_is_opaque() {
        assert_matches!(
            classify_sqlx_error(sqlx::Error::RowNotFound),
            StoreError::Other(_)
        );
    }

    #[test]
    fn decode_error_names_column() {
        let err = decode_error("status", "archived");
        assert_eq!(err.to_string(), "column status holds unknown value \"archived\"");
    }
}
