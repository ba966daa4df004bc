//! Deadline duration-bound check derived from a project type.
//!
//! Months are fixed 30-day blocks. The margin widens both bounds; the
//! creation-time check passes a margin of zero.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{CoreError, RuleViolation};
use crate::types::{Date, Timestamp};

pub const RULE_MIN_DURATION: &str = "min_duration_violation";
pub const RULE_MAX_DURATION: &str = "max_duration_violation";

/// Days in one estimation month.
pub const DAYS_PER_MONTH: i64 = 30;

/// Default tolerance applied at project start and on deadline updates.
pub const DEFAULT_MARGIN_DAYS: i64 = 30;

const MILLIS_PER_MONTH: f64 = (DAYS_PER_MONTH * 24 * 60 * 60 * 1000) as f64;

/// Estimated-duration bounds of a project type. `None` is unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBounds {
    pub min_months: Option<i32>,
    pub max_months: Option<i32>,
}

impl DurationBounds {
    pub fn is_unconstrained(&self) -> bool {
        self.min_months.is_none() && self.max_months.is_none()
    }
}

/// Validate a deadline against duration bounds as of `now`.
pub fn validate_deadline(
    deadline: Date,
    bounds: &DurationBounds,
    margin_days: i64,
    now: Timestamp,
) -> Result<(), CoreError> {
    let violations = deadline_violations(deadline, bounds, margin_days, now);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(CoreError::rules(
            "Deadline is outside the project type's duration bounds",
            violations,
        ))
    }
}

/// Bound violations for a deadline; empty when it is acceptable.
pub fn deadline_violations(
    deadline: Date,
    bounds: &DurationBounds,
    margin_days: i64,
    now: Timestamp,
) -> Vec<RuleViolation> {
    if bounds.is_unconstrained() {
        return Vec::new();
    }

    let deadline_at = deadline.and_time(NaiveTime::MIN).and_utc();
    let months_diff = (deadline_at - now).num_milliseconds() as f64 / MILLIS_PER_MONTH;
    let margin_months = margin_days as f64 / DAYS_PER_MONTH as f64;

    let mut violations = Vec::new();

    if let Some(min) = bounds.min_months {
        if months_diff + margin_months < f64::from(min) {
            let boundary =
                boundary_date(now, (i64::from(min) * DAYS_PER_MONTH).saturating_sub(margin_days));
            let message = match boundary {
                Some(boundary) => format!(
                    "Deadline must be on or after {boundary} (minimum {min} month(s)); received {deadline}"
                ),
                None => format!("Deadline must be at least {min} month(s) out; received {deadline}"),
            };
            violations.push(
                RuleViolation::new(RULE_MIN_DURATION, message).with_details(json!({
                    "min_months": min,
                    "boundary_date": boundary.map(|d| d.to_string()),
                    "received_date": deadline.to_string(),
                })),
            );
        }
    }

    if let Some(max) = bounds.max_months {
        if months_diff - margin_months > f64::from(max) {
            let boundary =
                boundary_date(now, (i64::from(max) * DAYS_PER_MONTH).saturating_add(margin_days));
            let message = match boundary {
                Some(boundary) => format!(
                    "Deadline must be on or before {boundary} (maximum {max} month(s)); received {deadline}"
                ),
                None => format!("Deadline must be at most {max} month(s) out; received {deadline}"),
            };
            violations.push(
                RuleViolation::new(RULE_MAX_DURATION, message).with_details(json!({
                    "max_months": max,
                    "boundary_date": boundary.map(|d| d.to_string()),
                    "received_date": deadline.to_string(),
                })),
            );
        }
    }

    violations
}

/// `None` when the boundary falls outside the representable date range.
fn boundary_date(now: Timestamp, days: i64) -> Option<Date> {
    let offset = Duration::try_days(days)?;
    now.checked_add_signed(offset).map(|at| at.date_naive())
}
