//! Field rules and the violation collector shared by the entity validators.
//!
//! Each getter records a violation and returns a placeholder on failure, so a
//! validator can visit every field before [`FieldChecker::finish`] reports
//! them all at once. Placeholders never escape: `finish` fails whenever a
//! violation was recorded.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::error::{CoreError, FieldViolation};
use crate::types::{Date, DbId, EntityId};

/// Raw request payload handed to a validator.
pub type RawInput = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Rule identifiers
// ---------------------------------------------------------------------------

pub const RULE_REQUIRED: &str = "required";
pub const RULE_INVALID_CHARACTERS: &str = "invalid_characters";
pub const RULE_INVALID_FORMAT: &str = "invalid_format";
pub const RULE_INVALID_VALUE: &str = "invalid_value";
pub const RULE_UNREGISTERED_COMBINATION: &str = "unregistered_combination";

/// Accepted date-only layout.
const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Primitive parsers
// ---------------------------------------------------------------------------

/// Parse a date from `YYYY-MM-DD` or an RFC 3339 timestamp (taken in UTC).
pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc).date_naive())
}

/// Locale-independent integer coercion of a JSON scalar.
///
/// Accepts JSON integers, floats without a fractional part, and trimmed
/// decimal strings. Grouping separators and other characters are rejected.
pub fn parse_numeric(value: &Value) -> Option<DbId> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<i64>().ok()
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Accumulates field violations across a whole input.
#[derive(Debug, Default)]
pub struct FieldChecker {
    violations: Vec<FieldViolation>,
    prefix: String,
}

impl FieldChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A checker whose field names are prefixed, e.g. `members[2].`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            violations: Vec::new(),
            prefix: prefix.into(),
        }
    }

    pub fn push(&mut self, field: &str, rule: &str) {
        self.violations
            .push(FieldViolation::new(format!("{}{field}", self.prefix), rule));
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Move another checker's violations into this one.
    pub fn absorb(&mut self, other: FieldChecker) {
        self.violations.extend(other.violations);
    }

    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }

    pub fn finish(self) -> Result<(), CoreError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::validation(self.violations))
        }
    }

    /// Non-empty string after trim.
    pub fn required_string(&mut self, input: &RawInput, field: &str) -> String {
        match input.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::String(_)) | Some(Value::Null) | None => {
                self.push(field, RULE_REQUIRED);
                String::new()
            }
            Some(_) => {
                self.push(field, RULE_INVALID_VALUE);
                String::new()
            }
        }
    }

    /// Trimmed string, `None` when absent, null or blank.
    pub fn optional_string(&mut self, input: &RawInput, field: &str) -> Option<String> {
        match input.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::String(_)) | Some(Value::Null) | None => None,
            Some(_) => {
                self.push(field, RULE_INVALID_VALUE);
                None
            }
        }
    }

    /// Scalar or array of numeric ids. Absent or null yields an empty list.
    pub fn numeric_array(&mut self, input: &RawInput, field: &str) -> Vec<DbId> {
        let items: Vec<&Value> = match input.get(field) {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(scalar) => vec![scalar],
        };

        let mut ids = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match parse_numeric(item) {
                Some(id) => ids.push(id),
                None => self.push(&format!("{field}[{index}]"), RULE_INVALID_CHARACTERS),
            }
        }
        ids
    }

    pub fn required_number(&mut self, input: &RawInput, field: &str) -> DbId {
        match input.get(field) {
            None | Some(Value::Null) => {
                self.push(field, RULE_REQUIRED);
                0
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.push(field, RULE_REQUIRED);
                0
            }
            Some(value) => parse_numeric(value).unwrap_or_else(|| {
                self.push(field, RULE_INVALID_CHARACTERS);
                0
            }),
        }
    }

    pub fn required_date(&mut self, input: &RawInput, field: &str) -> Date {
        match input.get(field) {
            None | Some(Value::Null) => {
                self.push(field, RULE_REQUIRED);
                NaiveDate::MIN
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.push(field, RULE_REQUIRED);
                NaiveDate::MIN
            }
            Some(Value::String(s)) => parse_date(s).unwrap_or_else(|| {
                self.push(field, RULE_INVALID_FORMAT);
                NaiveDate::MIN
            }),
            Some(_) => {
                self.push(field, RULE_INVALID_FORMAT);
                NaiveDate::MIN
            }
        }
    }

    /// Non-empty UUID string.
    pub fn required_id(&mut self, input: &RawInput, field: &str) -> EntityId {
        match input.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                EntityId::parse_str(s.trim()).unwrap_or_else(|_| {
                    self.push(field, RULE_INVALID_FORMAT);
                    EntityId::nil()
                })
            }
            Some(Value::String(_)) | Some(Value::Null) | None => {
                self.push(field, RULE_REQUIRED);
                EntityId::nil()
            }
            Some(_) => {
                self.push(field, RULE_INVALID_FORMAT);
                EntityId::nil()
            }
        }
    }

    /// Boolean flag, `default` when absent.
    pub fn optional_bool(&mut self, input: &RawInput, field: &str, default: bool) -> bool {
        match input.get(field) {
            None | Some(Value::Null) => default,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                self.push(field, RULE_INVALID_VALUE);
                default
            }
        }
    }
}

/// Parse a single raw deadline value outside a full entity input.
pub fn parse_deadline_value(value: &Value) -> Result<Date, CoreError> {
    let mut input = RawInput::new();
    input.insert("deadline".to_string(), value.clone());
    let mut checker = FieldChecker::new();
    let deadline = checker.required_date(&input, "deadline");
    checker.finish()?;
    Ok(deadline)
}
