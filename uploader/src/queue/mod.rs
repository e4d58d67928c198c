//! Upload queue controller.
//!
//! One [`UploadQueue`] backs one upload session (one open/close of the upload
//! dialog). It holds the files the user picked, submits them all at once and
//! folds the per-file results into a single outcome:
//!
//! ```text
//!   enqueue ──▶ [queue] ──submit──▶ one request per file ──settle all──┐
//!                  ▲                                                   │
//!                  │   failed files stay queued     all ok: clear,     │
//!                  └────────────────────────────────  notify, callback ◀┘
//!                      succeeded files ─▶ [completed]
//! ```
//!
//! Session state sits behind a mutex that is never held across an await, so
//! [`UploadQueue::snapshot`] stays answerable while a batch is in flight.
//! A submitted batch runs on its own task and settles even if the caller
//! goes away (e.g. an HTTP client disconnecting mid-request).

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::client::Uploader;
use crate::config::UploadConfig;
use crate::error::{QueueError, QueueResult};
use crate::models::{
    FileKey, QueuedFile, SessionSnapshot, SuccessRecord, UploadOutcome, UploadTarget,
};
use crate::notify::{Notification, Notifier};
use crate::settle::settle_all;
use crate::validation::check_size;

/// Result of [`UploadQueue::enqueue`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnqueueReport {
    /// Ids of the files appended to the queue.
    pub added: Vec<Uuid>,
    /// Names dropped because their `(name, size)` was already queued.
    pub duplicates: Vec<String>,
    /// Names refused for exceeding the size ceiling.
    pub rejected: Vec<String>,
}

/// Why a submit did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyQueue,
    /// Another submit has not settled yet.
    InFlight,
}

/// Result of [`UploadQueue::submit`]. Outcomes are in queue order.
#[derive(Debug, Clone)]
pub enum SubmitReport {
    Skipped(SkipReason),
    /// Every file was stored; the session is now empty.
    Completed(Vec<UploadOutcome>),
    /// Some files failed and remain queued.
    PartialFailure(Vec<UploadOutcome>),
    /// The session was reset while the batch was in flight; results dropped.
    Discarded(Vec<UploadOutcome>),
}

impl SubmitReport {
    pub fn outcomes(&self) -> &[UploadOutcome] {
        match self {
            SubmitReport::Skipped(_) => &[],
            SubmitReport::Completed(o)
            | SubmitReport::PartialFailure(o)
            | SubmitReport::Discarded(o) => o,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes().iter().filter(|o| o.success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes().iter().filter(|o| !o.success()).count()
    }
}

#[derive(Default)]
struct Session {
    queue: Vec<QueuedFile>,
    completed: Vec<SuccessRecord>,
    submitting: bool,
    /// Bumped by `reset`; a batch only applies to the generation it started in.
    generation: u64,
}

type CompletionCallback = Box<dyn Fn() + Send + Sync>;

/// Queue of files for one upload session.
///
/// Share it behind an `Arc`; every operation takes `&self`.
pub struct UploadQueue<U, N> {
    uploader: U,
    notifier: N,
    max_file_size: u64,
    on_complete: Option<CompletionCallback>,
    session: Mutex<Session>,
}

impl<U: Uploader, N: Notifier> UploadQueue<U, N> {
    pub fn new(uploader: U, notifier: N, config: &UploadConfig) -> Self {
        Self {
            uploader,
            notifier,
            max_file_size: config.max_file_size,
            on_complete: None,
            session: Mutex::new(Session::default()),
        }
    }

    /// Called once each time a batch fully succeeds, e.g. to refresh a listing.
    pub fn with_on_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add files, skipping `(name, size)` pairs already queued and refusing
    /// oversize files one by one. Order is kept.
    pub fn enqueue(&self, files: Vec<QueuedFile>) -> QueueResult<EnqueueReport> {
        let mut report = EnqueueReport::default();
        let mut refused = Vec::new();

        {
            let mut session = self.session();
            if session.submitting {
                return Err(QueueError::Busy);
            }

            let mut keys: HashSet<FileKey> = session.queue.iter().map(QueuedFile::key).collect();

            for file in files {
                if check_size(&file.name, file.size, self.max_file_size).is_err() {
                    refused.push(Notification::size_limit(&file.name, self.max_file_size));
                    report.rejected.push(file.name);
                    continue;
                }

                if !keys.insert(file.key()) {
                    report.duplicates.push(file.name);
                    continue;
                }

                report.added.push(file.id);
                session.queue.push(file);
            }
        }

        for notification in refused {
            self.notifier.notify(notification);
        }

        Ok(report)
    }

    /// Remove one queued file. Returns whether it was there.
    pub fn remove_one(&self, id: Uuid) -> QueueResult<bool> {
        let mut session = self.session();
        if session.submitting {
            return Err(QueueError::Busy);
        }

        match session.queue.iter().position(|f| f.id == id) {
            Some(index) => {
                session.queue.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove_all(&self) -> QueueResult<()> {
        let mut session = self.session();
        if session.submitting {
            return Err(QueueError::Busy);
        }
        session.queue.clear();
        Ok(())
    }

    /// Forget everything: queue, completed records, in-flight flag.
    pub fn reset(&self) {
        let mut session = self.session();
        let generation = session.generation.wrapping_add(1);
        *session = Session {
            generation,
            ..Session::default()
        };
    }

    pub fn is_submitting(&self) -> bool {
        self.session().submitting
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session();
        SessionSnapshot {
            submitting: session.submitting,
            queued: session.queue.iter().map(QueuedFile::view).collect(),
            completed: session.completed.clone(),
        }
    }

    /// Clear the in-flight flag of `generation`, if it is still current.
    fn release(&self, generation: u64) {
        let mut session = self.session();
        if session.generation == generation {
            session.submitting = false;
        }
    }

    async fn settle_batch(
        &self,
        batch: Vec<QueuedFile>,
        generation: u64,
        target: &UploadTarget,
    ) -> SubmitReport {
        let settled = settle_all(
            batch
                .iter()
                .enumerate()
                .map(|(index, file)| (index, self.uploader.upload(file, target))),
        )
        .await;
        let all_succeeded = settled.all_succeeded();

        let mut outcomes: Vec<(usize, UploadOutcome)> = settled
            .succeeded
            .into_iter()
            .map(|(index, stored)| (index, Ok(stored)))
            .chain(settled.failed.into_iter().map(|(index, err)| (index, Err(err))))
            .map(|(index, result)| {
                (
                    index,
                    UploadOutcome {
                        file: batch[index].clone(),
                        result,
                    },
                )
            })
            .collect();
        outcomes.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<UploadOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();

        for outcome in &outcomes {
            if let Some(err) = outcome.error() {
                eprintln!("   ⚠️  {} failed: {}", outcome.file.name, err);
            }
        }

        let mut session = self.session();
        if session.generation != generation {
            return SubmitReport::Discarded(outcomes);
        }
        session.submitting = false;

        if all_succeeded {
            session.queue.clear();
            session.completed.clear();
            drop(session);

            self.notifier
                .notify(Notification::upload_complete(outcomes.len()));
            if let Some(callback) = &self.on_complete {
                callback();
            }
            return SubmitReport::Completed(outcomes);
        }

        let uploaded: HashSet<Uuid> = outcomes
            .iter()
            .filter(|o| o.success())
            .map(|o| o.file.id)
            .collect();
        session.queue.retain(|f| !uploaded.contains(&f.id));
        session.completed.extend(outcomes.iter().filter_map(|o| {
            o.stored_path().map(|path| SuccessRecord {
                file_name: o.file.name.clone(),
                path: path.to_string(),
            })
        }));
        drop(session);

        let failed = outcomes.len() - uploaded.len();
        self.notifier
            .notify(Notification::partial_failure(uploaded.len(), failed));
        SubmitReport::PartialFailure(outcomes)
    }
}

impl<U: Uploader + 'static, N: Notifier + 'static> UploadQueue<U, N> {
    /// Upload every queued file to `target` concurrently and wait for all of
    /// them to settle.
    ///
    /// Per-file failures never escape: they come back in the report and the
    /// failed files stay queued for the next call. The batch runs on its own
    /// task, so dropping this future does not abandon it: the session is
    /// updated once every request settles.
    pub async fn submit(self: &Arc<Self>, target: &UploadTarget) -> SubmitReport {
        let (batch, generation) = {
            let mut session = self.session();
            if session.submitting {
                return SubmitReport::Skipped(SkipReason::InFlight);
            }
            if session.queue.is_empty() {
                return SubmitReport::Skipped(SkipReason::EmptyQueue);
            }
            session.submitting = true;
            (session.queue.clone(), session.generation)
        };

        let queue = Arc::clone(self);
        let target = target.clone();
        let batch = tokio::spawn(async move { queue.settle_batch(batch, generation, &target).await });

        match batch.await {
            Ok(report) => report,
            Err(err) => {
                self.release(generation);
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
                SubmitReport::Discarded(Vec::new())
            }
        }
    }
}
