//! Typed access to the keys the sync pipeline uses

use super::{KeyValueStore, StorageChange};
use crate::error::{Error, Result};
use crate::types::{Credentials, RepoId, SubmissionRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

/// Storage key names
pub mod keys {
    /// Access token
    pub const GITHUB_TOKEN: &str = "github_token";
    /// `owner/repo`
    pub const GITHUB_REPO: &str = "github_repo";
    /// Login of the token's owner
    pub const GITHUB_USERNAME: &str = "github_username";
    /// Records waiting for a successful sync
    pub const PENDING_SYNCS: &str = "pending_syncs";
    /// RFC 3339 time of the last successful sync
    pub const LAST_SYNC: &str = "last_sync";
    /// Filename of the last successful sync
    pub const LAST_SYNCED_FILE: &str = "last_synced_file";

    /// Keys whose change means the credentials changed
    pub const CREDENTIAL_KEYS: &[&str] = &[GITHUB_TOKEN, GITHUB_REPO];
}

/// When and what was last synced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSync {
    /// Completion time
    pub at: DateTime<Utc>,
    /// Synced filename
    pub file: String,
}

/// Connection and queue summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Token and repository are both stored
    pub connected: bool,
    /// Stored repository
    pub repo: Option<String>,
    /// Stored username
    pub username: Option<String>,
    /// Queued record count
    pub pending: usize,
    /// Last successful sync time
    pub last_sync: Option<DateTime<Utc>>,
    /// Last successfully synced filename
    pub last_synced_file: Option<String>,
}

/// Typed view over a [`KeyValueStore`]
///
/// Queue mutations are serialized within the process; across processes the
/// store is last-write-wins.
#[derive(Clone)]
pub struct LocalState {
    store: Arc<dyn KeyValueStore>,
    queue_lock: Arc<Mutex<()>>,
}

fn string_value(values: &Map<String, Value>, key: &str) -> Option<String> {
    values
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn parse_queue(value: Option<&Value>) -> Vec<SubmissionRecord> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "dropping unreadable pending entry");
                None
            }
        })
        .collect()
}

impl LocalState {
    /// Wrap a store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            queue_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Subscribe to raw key changes
    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.store.subscribe()
    }

    /// Token and repository, if both are stored and the repository is well formed
    pub async fn credentials(&self) -> Result<Option<Credentials>> {
        let values = self
            .store
            .get(&[keys::GITHUB_TOKEN, keys::GITHUB_REPO])
            .await?;
        let (Some(token), Some(repo)) = (
            string_value(&values, keys::GITHUB_TOKEN),
            string_value(&values, keys::GITHUB_REPO),
        ) else {
            return Ok(None);
        };
        match repo.parse::<RepoId>() {
            Ok(repo) => Ok(Some(Credentials { token, repo })),
            Err(e) => {
                warn!(%repo, error = %e, "stored repository is malformed, ignoring credentials");
                Ok(None)
            }
        }
    }

    /// Stored token alone
    pub async fn token(&self) -> Result<Option<String>> {
        let values = self.store.get(&[keys::GITHUB_TOKEN]).await?;
        Ok(string_value(&values, keys::GITHUB_TOKEN))
    }

    /// Stored repository alone
    pub async fn repo(&self) -> Result<Option<RepoId>> {
        let values = self.store.get(&[keys::GITHUB_REPO]).await?;
        string_value(&values, keys::GITHUB_REPO)
            .map(|r| r.parse())
            .transpose()
    }

    /// Stored username
    pub async fn username(&self) -> Result<Option<String>> {
        let values = self.store.get(&[keys::GITHUB_USERNAME]).await?;
        Ok(string_value(&values, keys::GITHUB_USERNAME))
    }

    /// Store a token and, if known, its owner's login
    pub async fn set_token(&self, token: &str, username: Option<&str>) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Auth("token is empty".to_string()));
        }
        let mut values = Map::new();
        values.insert(keys::GITHUB_TOKEN.to_string(), json!(token));
        if let Some(username) = username {
            values.insert(keys::GITHUB_USERNAME.to_string(), json!(username));
        }
        self.store.set(values).await
    }

    /// Store the target repository
    pub async fn set_repo(&self, repo: &RepoId) -> Result<()> {
        let mut values = Map::new();
        values.insert(keys::GITHUB_REPO.to_string(), json!(repo.to_string()));
        self.store.set(values).await
    }

    /// Queued records, oldest first
    pub async fn pending(&self) -> Result<Vec<SubmissionRecord>> {
        let values = self.store.get(&[keys::PENDING_SYNCS]).await?;
        Ok(parse_queue(values.get(keys::PENDING_SYNCS)))
    }

    /// Number of queued records
    pub async fn pending_count(&self) -> Result<usize> {
        Ok(self.pending().await?.len())
    }

    async fn write_queue(&self, queue: &[SubmissionRecord]) -> Result<()> {
        let mut values = Map::new();
        values.insert(keys::PENDING_SYNCS.to_string(), serde_json::to_value(queue)?);
        self.store.set(values).await
    }

    /// Append a record; returns the new queue length
    pub async fn push_pending(&self, record: &SubmissionRecord) -> Result<usize> {
        let _guard = self.queue_lock.lock().await;
        let mut queue = self.pending().await?;
        queue.push(record.clone());
        self.write_queue(&queue).await?;
        debug!(file = %record.filename(), pending = queue.len(), "record queued");
        Ok(queue.len())
    }

    /// Remove one queued copy of each given record, keeping everything else
    /// in order; returns the new queue length
    pub async fn remove_pending(&self, records: &[SubmissionRecord]) -> Result<usize> {
        let _guard = self.queue_lock.lock().await;
        let mut queue = self.pending().await?;
        if records.is_empty() {
            return Ok(queue.len());
        }
        for record in records {
            if let Some(pos) = queue.iter().position(|queued| queued == record) {
                queue.remove(pos);
            }
        }
        self.write_queue(&queue).await?;
        Ok(queue.len())
    }

    /// Drop every queued record
    pub async fn clear_pending(&self) -> Result<()> {
        let _guard = self.queue_lock.lock().await;
        self.store.remove(&[keys::PENDING_SYNCS]).await
    }

    /// Remember a successful sync
    pub async fn record_last_sync(&self, file: &str, at: DateTime<Utc>) -> Result<()> {
        let mut values = Map::new();
        values.insert(keys::LAST_SYNC.to_string(), json!(at.to_rfc3339()));
        values.insert(keys::LAST_SYNCED_FILE.to_string(), json!(file));
        self.store.set(values).await
    }

    /// Last successful sync, if any
    pub async fn last_sync(&self) -> Result<Option<LastSync>> {
        let values = self
            .store
            .get(&[keys::LAST_SYNC, keys::LAST_SYNCED_FILE])
            .await?;
        let (Some(at), Some(file)) = (
            string_value(&values, keys::LAST_SYNC),
            string_value(&values, keys::LAST_SYNCED_FILE),
        ) else {
            return Ok(None);
        };
        let at = DateTime::parse_from_rfc3339(&at)
            .map_err(|e| Error::Storage(format!("bad {} value: {e}", keys::LAST_SYNC)))?
            .with_timezone(&Utc);
        Ok(Some(LastSync { at, file }))
    }

    /// Everything a status display needs
    pub async fn report(&self) -> Result<StatusReport> {
        let last = self.last_sync().await?;
        Ok(StatusReport {
            connected: self.credentials().await?.is_some(),
            repo: self.repo().await.ok().flatten().map(|r| r.to_string()),
            username: self.username().await?,
            pending: self.pending_count().await?,
            last_sync: last.as_ref().map(|l| l.at),
            last_synced_file: last.map(|l| l.file),
        })
    }

    /// Forget everything (disconnect)
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.queue_lock.lock().await;
        self.store.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{Difficulty, ProblemInfo};

    fn state() -> LocalState {
        LocalState::new(Arc::new(MemoryStore::new()))
    }

    fn record(number: &str) -> SubmissionRecord {
        SubmissionRecord::new(
            ProblemInfo {
                number: number.to_string(),
                name: "TwoSum".to_string(),
                difficulty: Difficulty::Easy,
                full_title: format!("{number}. Two Sum"),
            },
            "print(1)".to_string(),
            "py".to_string(),
        )
    }

    #[tokio::test]
    async fn test_credentials_need_token_and_repo() {
        let state = state();
        assert!(state.credentials().await.unwrap().is_none());

        state.set_token("ghp_abc", Some("octo")).await.unwrap();
        assert!(state.credentials().await.unwrap().is_none());

        state.set_repo(&"octo/solutions".parse().unwrap()).await.unwrap();
        let creds = state.credentials().await.unwrap().unwrap();
        assert_eq!(creds.token, "ghp_abc");
        assert_eq!(creds.repo.to_string(), "octo/solutions");
        assert_eq!(state.username().await.unwrap().as_deref(), Some("octo"));
    }

    #[tokio::test]
    async fn test_malformed_repo_means_no_credentials() {
        let state = state();
        let mut values = Map::new();
        values.insert(keys::GITHUB_TOKEN.to_string(), json!("ghp_abc"));
        values.insert(keys::GITHUB_REPO.to_string(), json!("just-a-name"));
        state.store().set(values).await.unwrap();
        assert!(state.credentials().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_pending_keeps_order_and_newcomers() {
        let state = state();
        state.push_pending(&record("1")).await.unwrap();
        state.push_pending(&record("2")).await.unwrap();
        state.push_pending(&record("3")).await.unwrap();

        // "4" arrives while "1" and "3" are being committed.
        state.push_pending(&record("4")).await.unwrap();
        assert_eq!(state.remove_pending(&[record("1"), record("3")]).await.unwrap(), 2);

        let numbers: Vec<String> = state
            .pending()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.number)
            .collect();
        assert_eq!(numbers, vec!["2", "4"]);
    }

    #[tokio::test]
    async fn test_remove_pending_drops_one_copy_per_record() {
        let state = state();
        state.push_pending(&record("1")).await.unwrap();
        state.push_pending(&record("1")).await.unwrap();
        assert_eq!(state.remove_pending(&[record("1")]).await.unwrap(), 1);
        assert_eq!(state.remove_pending(&[]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_queue_entries_are_skipped() {
        let state = state();
        let mut values = Map::new();
        values.insert(
            keys::PENDING_SYNCS.to_string(),
            json!([{"garbage": true}, serde_json::to_value(record("7")).unwrap()]),
        );
        state.store().set(values).await.unwrap();
        assert_eq!(state.pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_last_sync_round_trip_and_clear() {
        let state = state();
        assert!(state.last_sync().await.unwrap().is_none());

        let at = Utc::now();
        state.record_last_sync("1-TwoSum.py", at).await.unwrap();
        let last = state.last_sync().await.unwrap().unwrap();
        assert_eq!(last.file, "1-TwoSum.py");
        assert_eq!(last.at.timestamp(), at.timestamp());

        state.clear().await.unwrap();
        assert!(state.last_sync().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_report() {
        let state = state();
        state.set_repo(&"octo/solutions".parse().unwrap()).await.unwrap();
        state.push_pending(&record("1")).await.unwrap();

        let report = state.report().await.unwrap();
        assert!(!report.connected);
        assert_eq!(report.repo.as_deref(), Some("octo/solutions"));
        assert_eq!(report.pending, 1);
        assert!(report.last_sync.is_none());
    }
}
