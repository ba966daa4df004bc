//! File resource types: owning-entity targets, purposes, and the registry of
//! valid `(target, purpose)` combinations with their link cardinality.

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of entity a file is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTarget {
    Project,
    Application,
    User,
}

impl ModelTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Application => "application",
            Self::User => "user",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "project" => Some(Self::Project),
            "application" => Some(Self::Application),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

/// What an attached file is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePurpose {
    Cover,
    Document,
    Deliverable,
    Attachment,
    Avatar,
}

impl FilePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Document => "document",
            Self::Deliverable => "deliverable",
            Self::Attachment => "attachment",
            Self::Avatar => "avatar",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cover" => Some(Self::Cover),
            "document" => Some(Self::Document),
            "deliverable" => Some(Self::Deliverable),
            "attachment" => Some(Self::Attachment),
            "avatar" => Some(Self::Avatar),
            _ => None,
        }
    }
}

/// How many live links a target may hold for one purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one live link per `(target, purpose)`.
    One,
    /// Any number of links, keyed additionally by file id.
    Many,
}

impl Cardinality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Many => "many",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "one" => Some(Self::One),
            "many" => Some(Self::Many),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registered `(target, purpose)` combinations.
pub const REGISTERED_COMBINATIONS: &[(ModelTarget, FilePurpose, Cardinality)] = &[
    (ModelTarget::Project, FilePurpose::Cover, Cardinality::One),
    (ModelTarget::Project, FilePurpose::Document, Cardinality::Many),
    (ModelTarget::Project, FilePurpose::Deliverable, Cardinality::Many),
    (ModelTarget::Application, FilePurpose::Attachment, Cardinality::Many),
    (ModelTarget::User, FilePurpose::Avatar, Cardinality::One),
];

/// Cardinality for a combination, or `None` if it is not registered.
pub fn cardinality_of(target: ModelTarget, purpose: FilePurpose) -> Option<Cardinality> {
    REGISTERED_COMBINATIONS
        .iter()
        .find(|(t, p, _)| *t == target && *p == purpose)
        .map(|(_, _, c)| *c)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Validated description of a file about to be attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub model_target: ModelTarget,
    pub purpose: FilePurpose,
    pub cardinality: Cardinality,
    pub is_default: bool,
}

/// A stored file row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: EntityId,
    pub stored_path: String,
    pub stored_name: String,
    pub original_name: String,
    pub mimetype: String,
    pub file_size: i64,
    pub file_kind: String,
    pub author_id: EntityId,
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert/replace payload for a file row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileRecord {
    pub stored_path: String,
    pub stored_name: String,
    pub original_name: String,
    pub mimetype: String,
    pub file_size: i64,
    pub file_kind: String,
    pub author_id: EntityId,
    pub is_default: bool,
}

/// Binding of a stored file to an owning entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLink {
    pub id: EntityId,
    pub file_id: EntityId,
    pub model_target: ModelTarget,
    pub uuid_target: EntityId,
    pub purpose: FilePurpose,
    pub cardinality: Cardinality,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl FileLink {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Insert payload for a link row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileLink {
    pub file_id: EntityId,
    pub model_target: ModelTarget,
    pub uuid_target: EntityId,
    pub purpose: FilePurpose,
    pub cardinality: Cardinality,
}

/// A live link joined with its file row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub link: FileLink,
    pub file: FileRecord,
}
