//! File-store port and the local filesystem backend.
//!
//! The file store is deliberately outside any database transaction; callers
//! that pair a save with a database write must compensate on failure (see
//! [`crate::resources`]).

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::resource::{FilePurpose, ModelTarget};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default root directory for the local backend.
pub const DEFAULT_STORAGE_ROOT: &str = "./storage";

/// File kind values derived from the mimetype.
pub const KIND_IMAGE: &str = "image";
pub const KIND_VIDEO: &str = "video";
pub const KIND_AUDIO: &str = "audio";
pub const KIND_DOCUMENT: &str = "document";
pub const KIND_ARCHIVE: &str = "archive";
pub const KIND_OTHER: &str = "other";

/// Longest extension kept from the original file name.
const MAX_EXTENSION_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("file storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid stored path '{0}'")]
    InvalidPath(String),

    #[error("file storage failed: {0}")]
    Backend(String),
}

/// Metadata accompanying the bytes on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub original_name: String,
    pub mimetype: String,
    pub model_target: ModelTarget,
    pub purpose: FilePurpose,
}

/// Where and what the backend wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub stored_path: String,
    pub stored_name: String,
    pub mimetype: String,
    pub file_size: i64,
    pub file_kind: String,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(&self, bytes: &[u8], request: &SaveRequest) -> Result<StoredObject, FileStoreError>;

    async fn delete(&self, stored_path: &str) -> Result<(), FileStoreError>;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Classify a mimetype into a coarse file kind.
pub fn file_kind_for(mimetype: &str) -> &'static str {
    let essence = mimetype
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some(("image", _)) => KIND_IMAGE,
        Some(("video", _)) => KIND_VIDEO,
        Some(("audio", _)) => KIND_AUDIO,
        Some(("text", _)) => KIND_DOCUMENT,
        Some(("application", sub)) => match sub {
            "pdf" | "msword" | "rtf" | "json" => KIND_DOCUMENT,
            s if s.starts_with("vnd.openxmlformats") || s.starts_with("vnd.oasis") => {
                KIND_DOCUMENT
            }
            "zip" | "gzip" | "x-tar" | "x-7z-compressed" | "x-rar-compressed" => KIND_ARCHIVE,
            _ => KIND_OTHER,
        },
        _ => KIND_OTHER,
    }
}

/// Lowercased alphanumeric extension of `name`, if it has a usable one.
fn sanitized_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Generate a collision-free stored name preserving the original extension.
pub fn stored_name_for(original_name: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match sanitized_extension(original_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Reject absolute paths and parent-directory components.
fn validate_relative(stored_path: &str) -> Result<&Path, FileStoreError> {
    let path = Path::new(stored_path);
    let ok = !stored_path.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if ok {
        Ok(path)
    } else {
        Err(FileStoreError::InvalidPath(stored_path.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Local filesystem backend
// ---------------------------------------------------------------------------

/// Stores files under `{root}/{model_target}/{purpose}/{stored_name}`.
///
/// `stored_path` values are relative to the root so the root can move.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of a stored path.
    pub fn resolve(&self, stored_path: &str) -> Result<PathBuf, FileStoreError> {
        Ok(self.root.join(validate_relative(stored_path)?))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, bytes: &[u8], request: &SaveRequest) -> Result<StoredObject, FileStoreError> {
        let stored_name = stored_name_for(&request.original_name);
        let stored_path = format!(
            "{}/{}/{}",
            request.model_target.as_str(),
            request.purpose.as_str(),
            stored_name
        );

        let absolute = self.resolve(&stored_path)?;
        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&absolute, bytes).await?;

        tracing::debug!(%stored_path, size = bytes.len(), "Stored file");

        Ok(StoredObject {
            stored_path,
            stored_name,
            mimetype: request.mimetype.clone(),
            file_size: bytes.len() as i64,
            file_kind: file_kind_for(&request.mimetype).to_string(),
        })
    }

    async fn delete(&self, stored_path: &str) -> Result<(), FileStoreError> {
        let absolute = self.resolve(stored_path)?;
        tokio::fs::remove_file(&absolute).await?;
        tracing::debug!(%stored_path, "Deleted stored file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn request(name: &str, mimetype: &str) -> SaveRequest {
        SaveRequest {
            original_name: name.to_string(),
            mimetype: mimetype.to_string(),
            model_target: ModelTarget::Project,
            purpose: FilePurpose::Document,
        }
    }

    #[test]
    fn classifies_common_mimetypes() {
        assert_eq!(file_kind_for("image/png"), KIND_IMAGE);
        assert_eq!(file_kind_for("application/pdf"), KIND_DOCUMENT);
        assert_eq!(file_kind_for("text/plain; charset=utf-8"), KIND_DOCUMENT);
        assert_eq!(file_kind_for("application/zip"), KIND_ARCHIVE);
        assert_eq!(file_kind_for("application/octet-stream"), KIND_OTHER);
        assert_eq!(file_kind_for("garbage"), KIND_OTHER);
    }

    #[test]
    fn stored_name_keeps_clean_extension() {
        assert!(stored_name_for("Report.PDF").ends_with(".pdf"));
        assert!(!stored_name_for("archive.t@r").contains('.'));
        assert!(!stored_name_for("no_extension").contains('.'));
    }

    #[test]
    fn parent_components_rejected() {
        assert_matches!(
            validate_relative("../etc/passwd"),
            Err(FileStoreError::InvalidPath(_))
        );
        assert_matches!(validate_relative("/abs/path"), Err(FileStoreError::InvalidPath(_)));
        assert!(validate_relative("project/document/a.pdf").is_ok());
    }

    #[tokio::test]
    async fn save_then_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        let stored = store
            .save(b"hello", &request("notes.txt", "text/plain"))
            .await
            .unwrap();
        assert!(stored.stored_path.starts_with("project/document/"));
        assert_eq!(stored.file_size, 5);
        assert_eq!(stored.file_kind, KIND_DOCUMENT);

        let absolute = store.resolve(&stored.stored_path).unwrap();
        assert_eq!(tokio::fs::read(&absolute).await.unwrap(), b"hello");

        store.delete(&stored.stored_path).await.unwrap();
        assert!(!absolute.exists());
    }

    #[tokio::test]
    async fn deleting_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        assert_matches!(
            store.delete("project/document/missing.bin").await,
            Err(FileStoreError::Io(_))
        );
    }
}
