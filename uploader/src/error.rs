//! Error types for the upload queue.
//!
//! - [`UploadError`] - A single file's request against the upload endpoint
//! - [`QueueError`] - Session mutations refused by the controller
//! - [`ConfigError`] - Environment / flag parsing
//! - [`ServerError`] - Session host API
//!
//! Per-file [`UploadError`]s never leave [`crate::queue::UploadQueue::submit`];
//! they are folded into the submit report. Everything else converts upward
//! via `From`, so `?` works across the boundaries.

use thiserror::Error;

use crate::validation::FieldErrors;

// =============================================================================
// Upload Errors
// =============================================================================

/// Failure of one upload request.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// Request never got a response (connect, DNS, timeout, body stream).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status.
    #[error("Server rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// 2xx response whose body could not be read as a stored file.
    #[error("Invalid upload response: {0}")]
    InvalidResponse(String),

    /// Payload could not be read from disk.
    #[error("Failed to read file: {0}")]
    Read(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Transport(err.to_string())
    }
}

// =============================================================================
// Queue Errors
// =============================================================================

/// Mutations the controller refuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A submit is in flight; the queue is frozen until it settles.
    #[error("An upload is already in progress")]
    Busy,

    /// File is over the configured ceiling.
    #[error("File '{name}' is {size} bytes, over the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },
}

// =============================================================================
// Configuration Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Variable present but not parseable.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    /// HTTP client could not be built from the configuration.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// Session host API errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Submit form failed validation.
    #[error("Invalid upload target: {0}")]
    InvalidTarget(FieldErrors),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Queued file not found: {0}")]
    NotFound(String),
}

impl From<FieldErrors> for ServerError {
    fn from(errors: FieldErrors) -> Self {
        ServerError::InvalidTarget(errors)
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result of one upload request.
pub type UploadResult<T> = Result<T, UploadError>;

/// Result type for queue mutations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for session host handlers.
pub type ServerResult<T> = Result<T, ServerError>;
