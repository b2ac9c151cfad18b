//! User-facing sync notifications
//!
//! The engine reports outcomes through [`SyncNotifier`] so each front end can
//! surface them its own way (terminal output, log lines, nothing).

use crate::error::Error;
use crate::types::SubmissionRecord;
use async_trait::async_trait;
use tracing::{info, warn};

/// Title and body of a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short headline
    pub title: String,
    /// One-line body
    pub message: String,
}

impl Notification {
    /// A file was written
    pub fn synced(filename: &str, updated: bool) -> Self {
        if updated {
            Self {
                title: "Solution Updated".to_string(),
                message: format!("{filename} updated on GitHub"),
            }
        } else {
            Self {
                title: "Solution Synced".to_string(),
                message: format!("{filename} synced to GitHub"),
            }
        }
    }

    /// A write failed and the record was queued
    pub fn failed(filename: &str) -> Self {
        Self {
            title: "Sync Failed".to_string(),
            message: format!("Failed to sync {filename}. Stored locally."),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Receives sync outcomes
#[async_trait]
pub trait SyncNotifier: Send + Sync {
    /// A record reached the remote store
    async fn on_synced(&self, record: &SubmissionRecord, updated: bool);

    /// A record could not be written and was queued
    async fn on_failed(&self, record: &SubmissionRecord, error: &Error);

    /// The pending queue length changed
    async fn on_pending_count(&self, count: usize);
}

/// Notifier that drops everything
pub struct NoopNotifier;

#[async_trait]
impl SyncNotifier for NoopNotifier {
    async fn on_synced(&self, _record: &SubmissionRecord, _updated: bool) {}
    async fn on_failed(&self, _record: &SubmissionRecord, _error: &Error) {}
    async fn on_pending_count(&self, _count: usize) {}
}

/// Notifier that writes to the tracing log
pub struct LogNotifier;

#[async_trait]
impl SyncNotifier for LogNotifier {
    async fn on_synced(&self, record: &SubmissionRecord, updated: bool) {
        let note = Notification::synced(&record.filename(), updated);
        info!(title = %note.title, "{}", note.message);
    }

    async fn on_failed(&self, record: &SubmissionRecord, error: &Error) {
        let note = Notification::failed(&record.filename());
        warn!(title = %note.title, error = %error, "{}", note.message);
    }

    async fn on_pending_count(&self, count: usize) {
        info!(pending = count, "pending sync count changed");
    }
}
