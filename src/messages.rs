//! Inbound wire messages and their dispatcher
//!
//! Messages are JSON objects tagged by `type`, for example
//! `{"type": "SOLUTION_SUBMITTED", "data": {...}}`. A submission is
//! acknowledged with `{"status": "received"}` before the sync runs.

use crate::error::Result;
use crate::storage::{LocalState, StatusReport};
use crate::store::parse_repo_id;
use crate::sync::SyncEngine;
use crate::types::SubmissionRecord;
use crate::watcher::SubmissionSink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A message from the page side or the settings UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    /// An accepted submission to sync
    SolutionSubmitted {
        /// The record
        data: SubmissionRecord,
    },
    /// OAuth finished; store the token
    GithubAuthSuccess {
        /// Access token
        token: String,
        /// Login of the token's owner
        #[serde(default)]
        username: Option<String>,
    },
    /// Choose the target repository
    SaveRepository {
        /// `owner/repo` or a repository URL
        repo: String,
    },
    /// Forget all local state
    Disconnect,
    /// Report connection and queue state
    GetStatus,
}

/// Reply to an [`InboundMessage`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// `received`, `stored`, `cleared`, `ok` or `error`
    pub status: String,
    /// Why a message was refused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Status details, for [`InboundMessage::GetStatus`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<serde_json::Value>,
}

impl MessageResponse {
    fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            error: None,
            report: None,
        }
    }

    /// `{"status": "received"}`
    pub fn received() -> Self {
        Self::status("received")
    }

    /// Refusal with a reason
    pub fn error(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::status("error")
        }
    }

    fn report(report: &StatusReport) -> Self {
        Self {
            report: serde_json::to_value(report).ok(),
            ..Self::status("ok")
        }
    }
}

/// Routes inbound messages to the sync engine and local state
///
/// Syncs run as background tasks so a submission is acknowledged at once.
pub struct Dispatcher {
    engine: Arc<SyncEngine>,
    min_code_len: usize,
    tasks: Mutex<JoinSet<()>>,
}

impl Dispatcher {
    /// Create a dispatcher that rejects records shorter than `min_code_len`
    pub fn new(engine: Arc<SyncEngine>, min_code_len: usize) -> Self {
        Self {
            engine,
            min_code_len,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    fn state(&self) -> &LocalState {
        self.engine.state()
    }

    /// Handle one message
    pub async fn handle(&self, message: InboundMessage) -> MessageResponse {
        match message {
            InboundMessage::SolutionSubmitted { data } => {
                if let Err(e) = data.validate(self.min_code_len) {
                    warn!(error = %e, "refusing malformed submission");
                    return MessageResponse::error(e);
                }
                self.spawn_sync(data);
                MessageResponse::received()
            }
            InboundMessage::GithubAuthSuccess { token, username } => {
                match self.state().set_token(&token, username.as_deref()).await {
                    Ok(()) => {
                        info!(username = ?username, "GitHub token stored");
                        MessageResponse::status("stored")
                    }
                    Err(e) => MessageResponse::error(e),
                }
            }
            InboundMessage::SaveRepository { repo } => match self.save_repository(&repo).await {
                Ok(()) => MessageResponse::status("stored"),
                Err(e) => MessageResponse::error(e),
            },
            InboundMessage::Disconnect => match self.state().clear().await {
                Ok(()) => {
                    info!("disconnected, local state cleared");
                    MessageResponse::status("cleared")
                }
                Err(e) => MessageResponse::error(e),
            },
            InboundMessage::GetStatus => match self.state().report().await {
                Ok(report) => MessageResponse::report(&report),
                Err(e) => MessageResponse::error(e),
            },
        }
    }

    async fn save_repository(&self, input: &str) -> Result<()> {
        let repo = parse_repo_id(input)?;
        info!(%repo, "repository saved");
        self.state().set_repo(&repo).await
    }

    fn spawn_sync(&self, record: SubmissionRecord) {
        let engine = Arc::clone(&self.engine);
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        // Reap finished syncs so the set does not grow without bound.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            match engine.sync_with_stored_credentials(&record).await {
                Ok(outcome) => debug!(?outcome, "sync finished"),
                Err(e) => warn!(file = %record.filename(), error = %e, "could not sync or queue record"),
            }
        });
    }

    /// Wait for every sync started so far
    pub async fn wait_idle(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "sync task panicked");
            }
        }
    }
}

#[async_trait]
impl SubmissionSink for Dispatcher {
    async fn dispatch(&self, record: SubmissionRecord) {
        let response = self.handle(InboundMessage::SolutionSubmitted { data: record }).await;
        debug!(status = %response.status, "submission dispatched");
    }
}
