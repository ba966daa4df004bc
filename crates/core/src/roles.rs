//! Well-known role name constants and advisor role resolution.
//!
//! These must match the seed data in the `roles` table migration.

use crate::entities::RoleConstraint;

pub const ROLE_RESEARCHER: &str = "researcher";
pub const ROLE_ADVISOR: &str = "advisor";
pub const ROLE_STUDENT: &str = "student";

/// Advisor role by whether the project type constrains a researcher role.
const ADVISOR_ROLE_TABLE: &[(bool, &str)] = &[(true, ROLE_RESEARCHER), (false, ROLE_ADVISOR)];

fn names_researcher(constraints: &[RoleConstraint]) -> bool {
    constraints
        .iter()
        .any(|c| c.role_name.eq_ignore_ascii_case(ROLE_RESEARCHER))
}

/// Role name the approving advisor is seeded with on a new project.
pub fn advisor_role_for(constraints: &[RoleConstraint]) -> &'static str {
    let key = names_researcher(constraints);
    ADVISOR_ROLE_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
        .unwrap_or(ROLE_ADVISOR)
}
