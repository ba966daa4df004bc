//! Request handlers. Each function maps one HTTP route onto one domain
//! operation; all business rules live in `propel_core`.

pub mod applications;
pub mod projects;
pub mod resources;
pub mod team;

use propel_core::types::EntityId;
use propel_core::validation::RawInput;
use serde_json::Value;

/// Put a path id into a raw body so the validator sees one input map.
pub(crate) fn with_path_id(mut input: RawInput, field: &str, id: EntityId) -> RawInput {
    input.insert(field.to_string(), Value::String(id.to_string()));
    input
}
