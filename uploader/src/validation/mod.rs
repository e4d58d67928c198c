//! Typed validation for upload forms.
//!
//! Form records arrive with every field optional and are checked into domain
//! values. A failed check returns every problem at once as [`FieldErrors`]
//! rather than stopping at the first one.
//!
//! # Example
//!
//! ```rust,ignore
//! use uploader::validation::UploadTargetForm;
//!
//! let form = UploadTargetForm {
//!     folder_id: Some("42".into()),
//!     path: Some("/assays/PPB-10001".into()),
//! };
//! let target = form.validate().unwrap();
//! assert_eq!(target.folder_id, "42");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::QueueError;
use crate::models::UploadTarget;

/// One invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All problems found in a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message for `field`, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{} {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

/// Submit form: where the queued files should go.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTargetForm {
    pub folder_id: Option<String>,
    pub path: Option<String>,
}

impl UploadTargetForm {
    /// Check the form into an [`UploadTarget`].
    ///
    /// - `folderId` must be present and not blank
    /// - `path` must be present, start with `/` and contain no `..` segment
    pub fn validate(&self) -> Result<UploadTarget, FieldErrors> {
        let mut errors = Vec::new();

        let folder_id = self
            .folder_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if folder_id.is_empty() {
            errors.push(FieldError::new("folderId", "is required"));
        }

        let path = self.path.as_deref().map(str::trim).unwrap_or_default();
        if path.is_empty() {
            errors.push(FieldError::new("path", "is required"));
        } else if !path.starts_with('/') {
            errors.push(FieldError::new("path", "must be absolute"));
        } else if path.split('/').any(|segment| segment == "..") {
            errors.push(FieldError::new("path", "must not contain '..'"));
        }

        if !errors.is_empty() {
            return Err(FieldErrors(errors));
        }

        Ok(UploadTarget {
            folder_id: folder_id.to_string(),
            path: path.to_string(),
        })
    }
}

/// Reject files over the size ceiling.
pub fn check_size(name: &str, size: u64, limit: u64) -> Result<(), QueueError> {
    if size > limit {
        return Err(QueueError::TooLarge {
            name: name.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}
