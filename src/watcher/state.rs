//! Submission watcher state machine
//!
//! ```text
//! Idle --submit click--> AwaitingVerdict --accepted--> Processing --done--> Idle
//!                              |
//!                              +--rejected--> Idle
//! ```
//!
//! Navigation resets everything, from any state.

use crate::types::ProblemInfo;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Where the watcher is in the submit/verdict cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// Nothing submitted
    Idle,
    /// Submit clicked, waiting for the judge
    AwaitingVerdict,
    /// Accepted verdict seen, building the record
    Processing,
}

/// Best-effort capture taken at the moment of the submit click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSnapshot {
    /// Editor text, if it could be read
    pub code: Option<String>,
    /// File extension
    pub language: String,
    /// Problem metadata, if it could be read
    pub problem: Option<ProblemInfo>,
    /// Page the capture belongs to
    pub url: String,
    /// When it was captured
    pub captured_at: Instant,
}

/// Watcher state shared between the event loop and its callbacks
#[derive(Debug)]
pub struct WatcherMachine {
    state: WatcherState,
    staged: Option<StagedSnapshot>,
    last_fingerprint: Option<String>,
    url: String,
    staging_ttl: Duration,
}

impl WatcherMachine {
    /// Start idle on `url`
    pub fn new(url: impl Into<String>, staging_ttl: Duration) -> Self {
        Self {
            state: WatcherState::Idle,
            staged: None,
            last_fingerprint: None,
            url: url.into(),
            staging_ttl,
        }
    }

    /// Current state
    pub const fn state(&self) -> WatcherState {
        self.state
    }

    /// Whether a submission is in flight
    pub fn is_submitting(&self) -> bool {
        self.state != WatcherState::Idle
    }

    /// URL the machine is armed for
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fingerprint of the last dispatched record
    pub fn last_fingerprint(&self) -> Option<&str> {
        self.last_fingerprint.as_deref()
    }

    /// Submit clicked: stage the snapshot, replacing any earlier one
    pub fn on_submit_click(&mut self, snapshot: StagedSnapshot) {
        if self.state != WatcherState::Idle {
            debug!(state = ?self.state, "submit clicked again, replacing staged snapshot");
        }
        self.staged = Some(snapshot);
        self.state = WatcherState::AwaitingVerdict;
    }

    /// Accepted verdict seen; false if no submit is awaiting one
    pub fn begin_processing(&mut self) -> bool {
        if self.state == WatcherState::AwaitingVerdict {
            self.state = WatcherState::Processing;
            true
        } else {
            false
        }
    }

    /// Failing verdict seen: drop the staged snapshot and go idle
    pub fn on_rejected(&mut self) {
        if self.state == WatcherState::AwaitingVerdict {
            self.staged = None;
            self.state = WatcherState::Idle;
        }
    }

    /// Take the staged snapshot if it is still fresh and belongs to the current page
    pub fn take_staged(&mut self, now: Instant) -> Option<StagedSnapshot> {
        let staged = self.staged.take()?;
        if staged.url != self.url {
            debug!(staged = %staged.url, current = %self.url, "staged snapshot is for another page");
            return None;
        }
        if now.duration_since(staged.captured_at) > self.staging_ttl {
            debug!("staged snapshot is stale");
            return None;
        }
        Some(staged)
    }

    /// Whether `fingerprint` matches the last dispatched record
    pub fn is_duplicate(&self, fingerprint: &str) -> bool {
        self.last_fingerprint.as_deref() == Some(fingerprint)
    }

    /// Remember a dispatched record's fingerprint
    pub fn mark_dispatched(&mut self, fingerprint: String) {
        self.last_fingerprint = Some(fingerprint);
    }

    /// Processing finished (dispatched, deduplicated or skipped)
    pub fn finish(&mut self) {
        self.state = WatcherState::Idle;
        self.staged = None;
    }

    /// Re-arm for `url`; returns false if the URL did not change
    pub fn navigate(&mut self, url: &str) -> bool {
        if url == self.url {
            return false;
        }
        debug!(from = %self.url, to = %url, "page changed, resetting watcher");
        self.url = url.to_string();
        self.state = WatcherState::Idle;
        self.staged = None;
        self.last_fingerprint = None;
        true
    }
}
