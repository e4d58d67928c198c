//! Domain models for the upload session.
//!
//! - [`QueuedFile`] - A selected file waiting to be uploaded
//! - [`FileKey`] - The `(name, size)` de-duplication key
//! - [`UploadTarget`] - Destination folder and path for a batch
//! - [`StoredFile`] - What the upload endpoint returns on success
//! - [`UploadOutcome`] - Settled result of one file's request
//! - [`SuccessRecord`] - A confirmed upload kept after a partial failure
//! - [`SessionSnapshot`] - Read-only view of a session

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use crate::error::{UploadError, UploadResult};

// =============================================================================
// Queued Files
// =============================================================================

/// De-duplication key for the queue.
///
/// Two distinct files with the same name and byte length collide; the queue
/// keeps whichever arrived first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    pub name: String,
    pub size: u64,
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}--{}", self.name, self.size)
    }
}

/// A user-selected file.
///
/// Cloning is cheap: the payload is shared.
#[derive(Clone)]
pub struct QueuedFile {
    /// Identity used by `remove_one`.
    pub id: Uuid,
    /// File name as offered by the user.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    payload: Bytes,
}

impl QueuedFile {
    /// Wrap an in-memory payload. The size is the payload length.
    pub fn new(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        let payload: Bytes = payload.into();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size: payload.len() as u64,
            payload,
        }
    }

    /// Read a file from disk, named after its last path component.
    pub async fn from_path(path: &Path) -> UploadResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::Read(format!("Invalid filename: {}", path.display())))?
            .to_string();

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| UploadError::Read(format!("{}: {}", path.display(), e)))?;

        Ok(Self::new(name, bytes))
    }

    pub fn key(&self) -> FileKey {
        FileKey {
            name: self.name.clone(),
            size: self.size,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Shared handle to the payload, for request bodies.
    pub fn body(&self) -> Bytes {
        self.payload.clone()
    }

    /// Metadata-only view for listings.
    pub fn view(&self) -> QueuedFileView {
        QueuedFileView {
            id: self.id,
            name: self.name.clone(),
            size: self.size,
        }
    }
}

impl fmt::Debug for QueuedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.size)
            .finish()
    }
}

/// A queued file without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedFileView {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
}

// =============================================================================
// Routing and Results
// =============================================================================

/// Where a batch goes. Built from a validated
/// [`crate::validation::UploadTargetForm`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    /// Destination storage folder identifier.
    pub folder_id: String,
    /// Target path inside the folder.
    pub path: String,
}

/// Success body of the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Server-side path of the stored file.
    pub path: String,
}

/// Settled result of one file's request. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub file: QueuedFile,
    pub result: UploadResult<StoredFile>,
}

impl UploadOutcome {
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&UploadError> {
        self.result.as_ref().err()
    }

    pub fn stored_path(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|s| s.path.as_str())
    }
}

/// A server-confirmed upload, shown apart from files still pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRecord {
    pub file_name: String,
    pub path: String,
}

// =============================================================================
// Session View
// =============================================================================

/// Read-only view of an upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub submitting: bool,
    pub queued: Vec<QueuedFileView>,
    pub completed: Vec<SuccessRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_key_format() {
        let file = QueuedFile::new("plate-1.csv", vec![0u8; 42]);
        assert_eq!(file.key().to_string(), "plate-1.csv--42");
    }

    #[test]
    fn test_clone_keeps_identity() {
        let file = QueuedFile::new("a.txt", b"abc".to_vec());
        let copy = file.clone();
        assert_eq!(file.id, copy.id);
        assert_eq!(copy.payload(), b"abc");
    }

    #[test]
    fn test_body_shares_payload() {
        let file = QueuedFile::new("plate.csv", vec![7u8; 1024]);
        let copy = file.clone();

        assert_eq!(file.body().as_ptr(), file.payload().as_ptr());
        assert_eq!(copy.body().as_ptr(), file.payload().as_ptr());
        assert_eq!(file.body().len(), 1024);
    }

    #[tokio::test]
    async fn test_from_path_reads_name_and_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.xlsx");
        std::fs::write(&path, b"0123456789").unwrap();

        let file = QueuedFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "results.xlsx");
        assert_eq!(file.size, 10);
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let dir = tempdir().unwrap();
        let err = QueuedFile::from_path(&dir.path().join("nope.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Read(_)));
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = SessionSnapshot {
            submitting: false,
            queued: vec![],
            completed: vec![SuccessRecord {
                file_name: "a.txt".into(),
                path: "/exp/a.txt".into(),
            }],
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["completed"][0]["fileName"], "a.txt");
    }
}
