//! Sync engine
//!
//! Writes accepted records into the remote repository under
//! `{difficulty}/{number}-{name}.{ext}`. Anything that cannot be written,
//! including records that arrive before credentials exist, lands in the local
//! pending queue; the queue is drained when credentials change, at host
//! start, or on request.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::{JsonFileStore, LocalState, keys};
use crate::store::{ContentStore, PutFileRequest, RemoteEntry, create_content_store};
use crate::sync::header::render_file;
use crate::sync::notify::{LogNotifier, SyncNotifier};
use crate::types::{Credentials, Difficulty, SubmissionRecord};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Commit message used when replacing an existing file
pub const UPDATE_MESSAGE: &str = "Updated Code";

/// Commit message for a new solution file
pub fn create_message(record: &SubmissionRecord) -> String {
    format!("Add solution: {} - {}", record.number, record.full_title)
}

/// Placeholder file that makes a difficulty directory exist
pub fn placeholder_path(difficulty: Difficulty) -> String {
    format!("{}/README.md", difficulty.as_str())
}

/// Text of a difficulty directory's placeholder
pub fn placeholder_text(difficulty: Difficulty) -> String {
    format!(
        "# {} Problems\n\nThis folder contains LeetCode problems of {} difficulty.",
        difficulty.title(),
        difficulty.as_str()
    )
}

/// Why a record went to the pending queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueReason {
    /// No token or repository configured
    NoCredentials,
    /// The remote write failed
    Failed(String),
}

/// What happened to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new file was created
    Created {
        /// Remote path
        path: String,
    },
    /// An existing file was replaced
    Updated {
        /// Remote path
        path: String,
    },
    /// The record was stored locally instead
    Queued {
        /// Why
        reason: QueueReason,
        /// Queue length afterwards
        pending: usize,
    },
}

impl SyncOutcome {
    /// Whether the record reached the remote store
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Updated { .. })
    }
}

/// Result of draining the pending queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Records written
    pub synced: usize,
    /// Records that failed again and were put back
    pub requeued: usize,
    /// Queue length afterwards
    pub pending: usize,
}

/// Pushes records to the remote store, falling back to the local queue
pub struct SyncEngine {
    store: Arc<dyn ContentStore>,
    state: LocalState,
    notifier: Arc<dyn SyncNotifier>,
    branch: String,
    path_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    drain_lock: tokio::sync::Mutex<()>,
}

impl SyncEngine {
    /// Create an engine that commits to `branch` and reports to the log
    pub fn new(store: Arc<dyn ContentStore>, state: LocalState, branch: impl Into<String>) -> Self {
        Self {
            store,
            state,
            notifier: Arc::new(LogNotifier),
            branch: branch.into(),
            path_locks: Mutex::new(HashMap::new()),
            drain_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Engine over the configured GitHub API and the JSON state file
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = create_content_store(config)?;
        let state = LocalState::new(Arc::new(JsonFileStore::open(&config.state_path)));
        Ok(Self::new(store, state, config.branch.as_str()))
    }

    /// Report outcomes to `notifier` instead of the log
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn SyncNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Local state this engine reads and writes
    pub const fn state(&self) -> &LocalState {
        &self.state
    }

    /// Sync one record
    ///
    /// Without credentials the record is queued and no request is made.
    /// Remote failures are queued too, so the only `Err` is a failure to
    /// write the local queue.
    pub async fn sync(
        &self,
        record: &SubmissionRecord,
        creds: Option<&Credentials>,
    ) -> Result<SyncOutcome> {
        let Some(creds) = creds else {
            info!(file = %record.filename(), "not connected to GitHub, storing locally");
            let pending = self.enqueue(record).await?;
            return Ok(SyncOutcome::Queued {
                reason: QueueReason::NoCredentials,
                pending,
            });
        };

        match self.push(record, creds).await {
            Ok(outcome) => {
                self.after_success(record, &outcome).await;
                Ok(outcome)
            }
            Err(e) => {
                warn!(path = %record.remote_path(), error = %e, "sync failed, storing locally");
                let pending = self.enqueue(record).await?;
                self.notifier.on_failed(record, &e).await;
                Ok(SyncOutcome::Queued {
                    reason: QueueReason::Failed(e.to_string()),
                    pending,
                })
            }
        }
    }

    /// Sync one record with whatever credentials are stored
    pub async fn sync_with_stored_credentials(&self, record: &SubmissionRecord) -> Result<SyncOutcome> {
        let creds = self.state.credentials().await?;
        self.sync(record, creds.as_ref()).await
    }

    /// Make sure each difficulty directory exists; returns how many were created
    ///
    /// Per-directory failures are logged and skipped.
    pub async fn ensure_directories(&self, creds: &Credentials) -> usize {
        let mut created = 0;
        for difficulty in Difficulty::ALL {
            let dir = difficulty.as_str();
            match self.store.lookup(creds, dir).await {
                Ok(Some(_)) => debug!(dir, "directory exists"),
                Ok(None) => {
                    let request = PutFileRequest::new(
                        format!("Create {dir} folder"),
                        &placeholder_text(difficulty),
                        None,
                        self.branch.as_str(),
                    );
                    match self
                        .store
                        .put_file(creds, &placeholder_path(difficulty), &request)
                        .await
                    {
                        Ok(_) => {
                            info!(dir, "created directory");
                            created += 1;
                        }
                        Err(e) => warn!(dir, error = %e, "failed to create directory"),
                    }
                }
                Err(e) => warn!(dir, error = %e, "failed to check directory"),
            }
        }
        created
    }

    /// Retry every queued record against the remote store
    ///
    /// Each record leaves the persisted queue only once it is committed, so
    /// an interrupted drain loses nothing. Records that fail again keep their
    /// place ahead of anything queued meanwhile.
    pub async fn drain_pending(&self, creds: &Credentials) -> Result<DrainReport> {
        let _drain = self.drain_lock.lock().await;
        // The queue stays on disk until each record is committed.
        let records = self.state.pending().await?;
        if records.is_empty() {
            debug!("pending queue is empty");
            return Ok(DrainReport::default());
        }
        info!(count = records.len(), "draining pending queue");

        let mut synced = Vec::new();
        let mut requeued = 0;
        for record in records {
            match self.push(&record, creds).await {
                Ok(outcome) => {
                    self.after_success(&record, &outcome).await;
                    synced.push(record);
                }
                Err(e) => {
                    warn!(path = %record.remote_path(), error = %e, "still cannot sync, keeping queued");
                    requeued += 1;
                }
            }
        }

        let pending = self.state.remove_pending(&synced).await?;
        self.notifier.on_pending_count(pending).await;
        info!(synced = synced.len(), requeued, pending, "pending queue drained");
        Ok(DrainReport {
            synced: synced.len(),
            requeued,
            pending,
        })
    }

    /// Drain using stored credentials; `None` if there are none
    pub async fn drain_with_stored_credentials(&self) -> Result<Option<DrainReport>> {
        match self.state.credentials().await? {
            Some(creds) => self.drain_pending(&creds).await.map(Some),
            None => Ok(None),
        }
    }

    /// React to credential changes: bootstrap directories, then drain
    ///
    /// Subscribes before returning, so changes made right after the call are
    /// seen. The task ends when the store is dropped.
    pub fn watch_credentials(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut changes = self.state.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if change.touches(keys::CREDENTIAL_KEYS) => {
                        engine.on_credentials_changed().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed storage changes, re-checking credentials");
                        engine.on_credentials_changed().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("credential watcher stopped");
        })
    }

    async fn on_credentials_changed(&self) {
        let creds = match self.state.credentials().await {
            Ok(Some(creds)) => creds,
            Ok(None) => {
                debug!("credentials changed but incomplete");
                return;
            }
            Err(e) => {
                warn!(error = %e, "failed to read credentials");
                return;
            }
        };
        info!(repo = %creds.repo, "credentials changed");
        self.ensure_directories(&creds).await;
        if let Err(e) = self.drain_pending(&creds).await {
            warn!(error = %e, "failed to drain pending queue");
        }
    }

    fn path_lock(&self, path: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.path_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(path.to_string()).or_default())
    }

    /// Bootstrap, write, and on a conflict or missing target bootstrap again
    /// and retry once; serialized per path
    async fn push(&self, record: &SubmissionRecord, creds: &Credentials) -> Result<SyncOutcome> {
        let path = record.remote_path();
        let lock = self.path_lock(&path);
        let _guard = lock.lock().await;

        self.ensure_directories(creds).await;
        match self.write_once(record, creds, &path).await {
            Err(e) if e.is_retryable_write() => {
                info!(%path, error = %e, "write rejected, retrying once");
                self.ensure_directories(creds).await;
                self.write_once(record, creds, &path).await
            }
            other => other,
        }
    }

    async fn write_once(
        &self,
        record: &SubmissionRecord,
        creds: &Credentials,
        path: &str,
    ) -> Result<SyncOutcome> {
        let sha = match self.store.lookup(creds, path).await? {
            Some(RemoteEntry::File(file)) => Some(file.sha),
            Some(RemoteEntry::Directory) => {
                return Err(Error::GitHubApi(format!("{path} is a directory")));
            }
            None => None,
        };
        let message = if sha.is_some() {
            UPDATE_MESSAGE.to_string()
        } else {
            create_message(record)
        };
        debug!(path, sha = ?sha, %message, "upserting solution");

        let request = PutFileRequest::new(message, &render_file(record), sha, self.branch.as_str());
        let result = self.store.put_file(creds, path, &request).await?;
        let path = path.to_string();
        Ok(if result.created {
            SyncOutcome::Created { path }
        } else {
            SyncOutcome::Updated { path }
        })
    }

    async fn after_success(&self, record: &SubmissionRecord, outcome: &SyncOutcome) {
        let filename = record.filename();
        info!(path = %record.remote_path(), ?outcome, "solution synced");
        if let Err(e) = self.state.record_last_sync(&filename, Utc::now()).await {
            warn!(error = %e, "failed to record last sync");
        }
        self.notifier
            .on_synced(record, matches!(outcome, SyncOutcome::Updated { .. }))
            .await;
    }

    async fn enqueue(&self, record: &SubmissionRecord) -> Result<usize> {
        let pending = self.state.push_pending(record).await?;
        self.notifier.on_pending_count(pending).await;
        Ok(pending)
    }
}
