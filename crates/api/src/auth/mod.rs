//! Authentication primitives.
//!
//! - [`jwt`] -- HS256 access-token validation. Tokens are issued by the
//!   identity service; this server only verifies them.

pub mod jwt;
