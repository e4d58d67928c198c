//! Test doubles for the queue and the session host.

use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::Semaphore;

use crate::client::Uploader;
use crate::error::{UploadError, UploadResult};
use crate::models::{QueuedFile, StoredFile, UploadTarget};
use crate::notify::{Notification, NotificationKind, Notifier};

/// Uploader that fails for chosen file names and records every call.
///
/// Stored paths are `{target.path}/{file.name}`. A gated uploader holds every
/// request until [`ScriptedUploader::open_gate`].
pub(crate) struct ScriptedUploader {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    targets: Mutex<Vec<UploadTarget>>,
    gate: Option<Semaphore>,
}

impl ScriptedUploader {
    pub(crate) fn new() -> Self {
        Self {
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            targets: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub(crate) fn failing(names: &[&str]) -> Self {
        let uploader = Self::new();
        uploader
            .failing
            .lock()
            .unwrap()
            .extend(names.iter().map(|n| n.to_string()));
        uploader
    }

    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    /// Let `name` succeed from now on.
    pub(crate) fn heal(&self, name: &str) {
        self.failing.lock().unwrap().remove(name);
    }

    pub(crate) fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    /// File names in request order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn targets(&self) -> Vec<UploadTarget> {
        self.targets.lock().unwrap().clone()
    }
}

impl Uploader for ScriptedUploader {
    async fn upload(&self, file: &QueuedFile, target: &UploadTarget) -> UploadResult<StoredFile> {
        self.calls.lock().unwrap().push(file.name.clone());
        self.targets.lock().unwrap().push(target.clone());

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }

        if self.failing.lock().unwrap().contains(&file.name) {
            return Err(UploadError::Rejected {
                status: 500,
                body: "scripted failure".into(),
            });
        }

        Ok(StoredFile {
            path: format!("{}/{}", target.path, file.name),
        })
    }
}

/// Notifier that keeps everything it receives.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(crate) fn all(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, kind: NotificationKind) -> usize {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().unwrap().push(notification);
    }
}
