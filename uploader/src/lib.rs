//! # Uploader - batch file uploads for Study Tracker
//!
//! Queues files picked by a user, uploads them all at once to a Study Tracker
//! storage folder, and reports a single outcome. When some files fail, the
//! ones that made it are set aside and the rest stay queued for another try.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Files (CLI/ │────▶│ UploadQueue │────▶│ settle_all  │────▶│  Uploader   │
//! │  browser)   │     │ (session)   │     │ (per file)  │     │ (multipart) │
//! └─────────────┘     └──────┬──────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │  Notifier   │  success / partial failure / size limit
//!                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use uploader::{HttpUploader, NotificationHub, QueuedFile, UploadConfig, UploadQueue, UploadTargetForm};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UploadConfig::from_env()?;
//!     let queue = Arc::new(UploadQueue::new(HttpUploader::new(&config)?, NotificationHub::new(), &config));
//!
//!     queue.enqueue(vec![QueuedFile::from_path("plate-1.csv".as_ref()).await?])?;
//!     let target = UploadTargetForm {
//!         folder_id: Some("12".into()),
//!         path: Some("/studies/CPA-10001".into()),
//!     }
//!     .validate()?;
//!
//!     let report = queue.submit(&target).await;
//!     println!("{} uploaded, {} failed", report.succeeded(), report.failed());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`config`] - Defaults and environment configuration
//! - [`models`] - Queued files, targets, outcomes, snapshots
//! - [`validation`] - Typed form validation and the size ceiling
//! - [`settle`] - Settle-all combinator
//! - [`client`] - Upload endpoint client
//! - [`notify`] - User notifications
//! - [`queue`] - Upload queue controller
//! - [`api`] - HTTP session host

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Checks
pub mod validation;

// Concurrency
pub mod settle;

// Collaborators
pub mod client;
pub mod notify;

// Controller
pub mod queue;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::UploadConfig;

pub use error::{ConfigError, QueueError, ServerError, UploadError};

pub use models::{
    FileKey, QueuedFile, QueuedFileView, SessionSnapshot, StoredFile, SuccessRecord,
    UploadOutcome, UploadTarget,
};

pub use validation::{check_size, FieldError, FieldErrors, UploadTargetForm};

pub use settle::{settle_all, Settled};

pub use client::{HttpUploader, Uploader};

pub use notify::{Level, Notification, NotificationHub, NotificationKind, Notifier};

pub use queue::{EnqueueReport, SkipReason, SubmitReport, UploadQueue};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
