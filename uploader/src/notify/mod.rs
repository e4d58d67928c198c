//! User-facing notifications.
//!
//! The queue reports three things to the user: a batch fully uploaded, a batch
//! that partially failed, and a file refused for size. [`Notifier`] is the seam;
//! [`NotificationHub`] prints each entry and fans it out to subscribers (the
//! session host streams them to browsers over SSE).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::NOTIFICATION_CAPACITY;

/// Severity, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// What the notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    /// Every file of a batch was stored.
    UploadComplete,
    /// At least one file of a batch failed.
    PartialFailure,
    /// A file was refused on enqueue for exceeding the size ceiling.
    SizeLimit,
}

/// A single transient message for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: Level,
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: Level, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            level,
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn upload_complete(count: usize) -> Self {
        Self::new(
            Level::Success,
            NotificationKind::UploadComplete,
            format!("Uploaded {} file(s)", count),
        )
    }

    pub fn partial_failure(succeeded: usize, failed: usize) -> Self {
        Self::new(
            Level::Error,
            NotificationKind::PartialFailure,
            format!(
                "{} of {} file(s) failed to upload. Failed files remain queued and can be retried.",
                failed,
                succeeded + failed
            ),
        )
    }

    pub fn size_limit(name: &str, limit: u64) -> Self {
        Self::new(
            Level::Warning,
            NotificationKind::SizeLimit,
            format!(
                "{} exceeds the maximum file size of {} MB",
                name,
                limit / (1024 * 1024)
            ),
        )
    }
}

/// Receives notifications from the queue.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Prints notifications and broadcasts them to every subscriber.
///
/// Build one at start-up and share it; clones publish on the same channel.
#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::with_capacity(NOTIFICATION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receiver for streaming; only sees notifications sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotificationHub {
    fn notify(&self, notification: Notification) {
        let prefix = match notification.level {
            Level::Info => "   ",
            Level::Success => "   ✓",
            Level::Warning => "   ⚠️",
            Level::Error => "   ❌",
        };
        println!("{} {}", prefix, notification.message);

        // No subscribers is fine
        let _ = self.sender.send(notification);
    }
}
