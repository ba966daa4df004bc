//! Team composition check against per-role quotas.
//!
//! Pure: callers load the members and the project type's constraints and
//! pass them in. All violations are collected before failing.

use std::collections::BTreeMap;

use serde_json::json;

use crate::entities::RoleConstraint;
use crate::error::{CoreError, RuleViolation};
use crate::types::DbId;

pub const RULE_INVALID_ROLE: &str = "invalid_role";
pub const RULE_MAX_COUNT_EXCEEDED: &str = "max_count_exceeded";
pub const RULE_MIN_COUNT_NOT_MET: &str = "min_count_not_met";

/// Validate a multiset of member role ids against role constraints.
pub fn validate_team_composition(
    member_role_ids: &[DbId],
    constraints: &[RoleConstraint],
) -> Result<(), CoreError> {
    let violations = team_composition_violations(member_role_ids, constraints);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(CoreError::rules(
            "Team composition does not satisfy the project type's role quotas",
            violations,
        ))
    }
}

/// Every quota violation, ordered by role id.
pub fn team_composition_violations(
    member_role_ids: &[DbId],
    constraints: &[RoleConstraint],
) -> Vec<RuleViolation> {
    let mut counts: BTreeMap<DbId, i64> = BTreeMap::new();
    for role_id in member_role_ids {
        *counts.entry(*role_id).or_default() += 1;
    }

    let by_role: BTreeMap<DbId, &RoleConstraint> =
        constraints.iter().map(|c| (c.role_id, c)).collect();

    let mut violations = Vec::new();

    for (&role_id, &count) in &counts {
        match by_role.get(&role_id) {
            None => violations.push(
                RuleViolation::new(
                    RULE_INVALID_ROLE,
                    format!("Role {role_id} is not allowed for this project type"),
                )
                .with_details(json!({ "role_id": role_id, "count": count })),
            ),
            Some(c) => {
                if let Some(max) = c.max_count {
                    if count > i64::from(max) {
                        violations.push(
                            RuleViolation::new(
                                RULE_MAX_COUNT_EXCEEDED,
                                format!(
                                    "Role '{}' allows at most {max} member(s), found {count}",
                                    c.role_name
                                ),
                            )
                            .with_details(json!({
                                "role_id": role_id,
                                "role_name": c.role_name,
                                "max_count": max,
                                "count": count,
                            })),
                        );
                    }
                }
            }
        }
    }

    for (&role_id, c) in &by_role {
        let count = counts.get(&role_id).copied().unwrap_or(0);
        if c.min_count > 0 && count < i64::from(c.min_count) {
            violations.push(
                RuleViolation::new(
                    RULE_MIN_COUNT_NOT_MET,
                    format!(
                        "Role '{}' requires at least {} member(s), found {count}",
                        c.role_name, c.min_count
                    ),
                )
                .with_details(json!({
                    "role_id": role_id,
                    "role_name": c.role_name,
                    "min_count": c.min_count,
                    "count": count,
                })),
            );
        }
    }

    violations.sort_by_key(|v| v.details["role_id"].as_i64().unwrap_or_default());
    violations
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn constraint(role_id: DbId, min: i32, max: Option<i32>) -> RoleConstraint {
        RoleConstraint {
            role_id,
            role_name: format!("role-{role_id}"),
            min_count: min,
            max_count: max,
        }
    }

    #[test]
    fn satisfied_team_passes() {
        let constraints = [constraint(1, 1, Some(1)), constraint(2, 2, None)];
        assert!(validate_team_composition(&[1, 2, 2, 2], &constraints).is_ok());
    }

    #[test]
    fn empty_team_with_no_minimums_passes() {
        let constraints = [constraint(1, 0, Some(3))];
        assert!(validate_team_composition(&[], &constraints).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let constraints = [
            constraint(1, 1, Some(1)),
            constraint(2, 3, None),
            constraint(3, 1, None),
        ];
        let err = validate_team_composition(&[1, 1, 2, 9], &constraints).unwrap_err();
        assert_eq!(
            err.rule_names(),
            vec![
                RULE_MAX_COUNT_EXCEEDED,
                RULE_MIN_COUNT_NOT_MET,
                RULE_MIN_COUNT_NOT_MET,
                RULE_INVALID_ROLE,
            ]
        );
    }

    #[test]
    fn min_checked_for_roles_with_zero_members() {
        let violations = team_composition_violations(&[], &[constraint(4, 2, None)]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, RULE_MIN_COUNT_NOT_MET);
        assert_eq!(violations[0].details["count"], 0);
    }

    /// Randomised check of the three failure categories against a direct
    /// restatement of the quota rules.
    #[test]
    fn randomized_quotas_match_reference_rules() {
        let mut rng = rand::rng();

        for _ in 0..500 {
            let role_count: DbId = rng.random_range(1..=4);
            let mut constraints: Vec<RoleConstraint> = Vec::new();
            for role_id in 1..=role_count {
                if !rng.random_bool(0.8) {
                    continue;
                }
                let min: i32 = rng.random_range(0..=2);
                let max = if rng.random_bool(0.5) {
                    Some(min + rng.random_range(0..=2))
                } else {
                    None
                };
                constraints.push(constraint(role_id, min, max));
            }

            let member_count: usize = rng.random_range(0..=6);
            let members: Vec<DbId> = (0..member_count)
                .map(|_| rng.random_range(1..=role_count + 1))
                .collect();

            let count_of = |role: DbId| members.iter().filter(|r| **r == role).count() as i32;

            let expect_invalid = members
                .iter()
                .any(|r| !constraints.iter().any(|c| c.role_id == *r));
            let expect_max = constraints
                .iter()
                .any(|c| c.max_count.is_some_and(|max| count_of(c.role_id) > max));
            let expect_min = constraints
                .iter()
                .any(|c| c.min_count > 0 && count_of(c.role_id) < c.min_count);

            let violations = team_composition_violations(&members, &constraints);
            let has = |rule: &str| violations.iter().any(|v| v.rule == rule);

            assert_eq!(has(RULE_INVALID_ROLE), expect_invalid, "{members:?} {constraints:?}");
            assert_eq!(has(RULE_MAX_COUNT_EXCEEDED), expect_max, "{members:?} {constraints:?}");
            assert_eq!(has(RULE_MIN_COUNT_NOT_MET), expect_min, "{members:?} {constraints:?}");
            assert_eq!(
                validate_team_composition(&members, &constraints).is_ok(),
                !(expect_invalid || expect_max || expect_min)
            );
        }
    }
}
