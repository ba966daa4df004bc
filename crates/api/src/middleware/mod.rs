//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireReviewer`] -- Requires the `reviewer` or `admin` role.

pub mod auth;
pub mod rbac;
