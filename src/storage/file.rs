//! JSON file store
//!
//! The file is the source of truth: every operation re-reads it, so a CLI
//! invocation and a running host see each other's writes. Writes go to a
//! sibling temp file first and are renamed into place.

use super::{CHANGE_CHANNEL_CAPACITY, KeyValueStore, StorageChange, announce, merge, remove_keys, select};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

/// Store backed by a single JSON object on disk
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
    changes: broadcast::Sender<StorageChange>,
}

impl JsonFileStore {
    /// Use `path`; the file is created on first write
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            changes,
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&text)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn save(&self, data: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(data)?;
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), keys = data.len(), "state saved");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let _guard = self.lock.lock().await;
        Ok(select(&self.load().await?, keys))
    }

    async fn set(&self, values: Map<String, Value>) -> Result<()> {
        let changed = {
            let _guard = self.lock.lock().await;
            let mut data = self.load().await?;
            let changed = merge(&mut data, values);
            if !changed.is_empty() {
                self.save(&data).await?;
            }
            changed
        };
        announce(&self.changes, changed);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let changed = {
            let _guard = self.lock.lock().await;
            let mut data = self.load().await?;
            let changed = remove_keys(&mut data, keys);
            if !changed.is_empty() {
                self.save(&data).await?;
            }
            changed
        };
        announce(&self.changes, changed);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let changed = {
            let _guard = self.lock.lock().await;
            let data = self.load().await?;
            let mut keys: Vec<String> = data.keys().cloned().collect();
            keys.sort();
            if !keys.is_empty() {
                self.save(&Map::new()).await?;
            }
            keys
        };
        announce(&self.changes, changed);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
