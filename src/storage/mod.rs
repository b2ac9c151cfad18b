//! Local persistent key-value store
//!
//! Holds credentials, the pending sync queue and last-sync metadata. Values
//! are JSON; every mutation that changes a key is announced on a broadcast
//! channel so listeners can react to credential changes.

mod file;
mod memory;
mod state;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use state::{LastSync, LocalState, StatusReport, keys};

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

/// Capacity of the change broadcast; slow listeners see `Lagged` past this
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Keys whose values changed in one mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// Changed keys, sorted
    pub keys: Vec<String>,
}

impl StorageChange {
    /// Whether any of `keys` changed
    pub fn touches(&self, keys: &[&str]) -> bool {
        self.keys.iter().any(|k| keys.contains(&k.as_str()))
    }
}

/// Key-value store with change notification
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Values for the requested keys; absent keys are omitted
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    /// Merge `values` into the store
    async fn set(&self, values: Map<String, Value>) -> Result<()>;

    /// Delete keys
    async fn remove(&self, keys: &[&str]) -> Result<()>;

    /// Delete everything
    async fn clear(&self) -> Result<()>;

    /// Subscribe to changes made after this call
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// Apply `values` to `data`, returning the keys whose value actually changed
pub(crate) fn merge(data: &mut Map<String, Value>, values: Map<String, Value>) -> Vec<String> {
    let mut changed = Vec::new();
    for (key, value) in values {
        if data.get(&key) != Some(&value) {
            changed.push(key.clone());
            data.insert(key, value);
        }
    }
    changed.sort();
    changed
}

/// Remove `keys` from `data`, returning the ones that were present
pub(crate) fn remove_keys(data: &mut Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let mut changed: Vec<String> = keys
        .iter()
        .filter(|k| data.remove(**k).is_some())
        .map(ToString::to_string)
        .collect();
    changed.sort();
    changed
}

/// Copy out the requested keys
pub(crate) fn select(data: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|k| data.get(*k).map(|v| ((*k).to_string(), v.clone())))
        .collect()
}

/// Announce `keys` if any; no receivers is fine
pub(crate) fn announce(tx: &broadcast::Sender<StorageChange>, keys: Vec<String>) {
    if !keys.is_empty() {
        let _ = tx.send(StorageChange { keys });
    }
}
