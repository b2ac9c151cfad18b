//! In-memory store

use super::{CHANGE_CHANNEL_CAPACITY, KeyValueStore, StorageChange, announce, merge, remove_keys, select};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, broadcast};

/// Store that lives and dies with the process
pub struct MemoryStore {
    data: Mutex<Map<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            data: Mutex::new(Map::new()),
            changes,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        Ok(select(&*self.data.lock().await, keys))
    }

    async fn set(&self, values: Map<String, Value>) -> Result<()> {
        let changed = merge(&mut *self.data.lock().await, values);
        announce(&self.changes, changed);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let changed = remove_keys(&mut *self.data.lock().await, keys);
        announce(&self.changes, changed);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let changed = {
            let mut data = self.data.lock().await;
            let mut keys: Vec<String> = data.keys().cloned().collect();
            keys.sort();
            data.clear();
            keys
        };
        announce(&self.changes, changed);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
