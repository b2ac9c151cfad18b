//! Test fixtures for creating records, credentials and state

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use leetsync::error::Error;
use leetsync::storage::{LocalState, MemoryStore};
use leetsync::sync::SyncNotifier;
use leetsync::types::{Credentials, Difficulty, SubmissionRecord};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Create a submission record
pub fn make_record(number: &str, name: &str, difficulty: Difficulty, language: &str) -> SubmissionRecord {
    SubmissionRecord {
        number: number.to_string(),
        name: name.to_string(),
        difficulty,
        full_title: format!("{number}. {name}"),
        code: "class Solution:\n    def solve(self):\n        return 1\n".to_string(),
        language: language.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
    }
}

/// The canonical "1. Two Sum" record in Python
pub fn two_sum() -> SubmissionRecord {
    make_record("1", "TwoSum", Difficulty::Easy, "py")
}

/// Credentials for `octocat/solutions`
pub fn make_creds() -> Credentials {
    Credentials {
        token: "ghp_test".to_string(),
        repo: "octocat/solutions".parse().unwrap(),
    }
}

/// Local state backed by memory
pub fn memory_state() -> LocalState {
    LocalState::new(Arc::new(MemoryStore::new()))
}

/// Local state that already holds [`make_creds`]
pub async fn connected_state() -> LocalState {
    let state = memory_state();
    let creds = make_creds();
    state.set_token(&creds.token, Some("octocat")).await.unwrap();
    state.set_repo(&creds.repo).await.unwrap();
    state
}

/// What a [`RecordingNotifier`] saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notified {
    Synced { file: String, updated: bool },
    Failed { file: String },
    Pending(usize),
}

/// Notifier that keeps every call
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<Notified>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<Notified> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncNotifier for RecordingNotifier {
    async fn on_synced(&self, record: &SubmissionRecord, updated: bool) {
        self.events.lock().unwrap().push(Notified::Synced {
            file: record.filename(),
            updated,
        });
    }

    async fn on_failed(&self, record: &SubmissionRecord, _error: &Error) {
        self.events.lock().unwrap().push(Notified::Failed {
            file: record.filename(),
        });
    }

    async fn on_pending_count(&self, count: usize) {
        self.events.lock().unwrap().push(Notified::Pending(count));
    }
}

/// Poll `check` until it holds, failing the test after a few seconds
pub async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check().await {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
