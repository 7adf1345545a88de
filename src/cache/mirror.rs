//! Durable Mirror Module
//!
//! Write-through copy of the index in a persistent key-value store. Every
//! operation is best-effort: failures are logged and swallowed, the in-memory
//! index stays the source of truth for the running process.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, PersistedRecord};
use crate::storage::KeyValueStore;

/// Result of reading the mirror at startup.
#[derive(Debug, Default)]
pub struct MirrorLoad {
    /// Valid entries to seed the index with
    pub entries: Vec<CacheEntry>,
    /// Cache keys of expired or unreadable records, to purge in the background
    pub stale_keys: Vec<String>,
}

// == Durable Mirror ==
#[derive(Clone)]
pub struct DurableMirror {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl DurableMirror {
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Durable key for a cache key.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    // == Load All ==
    /// Reads every persisted entry, keeping only valid ones.
    ///
    /// Expired records and records that fail to parse are reported in
    /// `stale_keys` rather than returned. A store that cannot be read at all
    /// yields an empty load.
    pub async fn load_all(&self) -> MirrorLoad {
        let pairs = match self.store.get_all(&self.namespace).await {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!("Failed to read durable cache, starting empty: {}", e);
                return MirrorLoad::default();
            }
        };

        let now = current_timestamp_ms();
        let mut load = MirrorLoad::default();

        for (storage_key, raw) in pairs {
            let Some(key) = storage_key.strip_prefix(&self.namespace) else {
                continue;
            };
            match PersistedRecord::parse(&raw) {
                Ok(record) => {
                    let entry = CacheEntry::from_record(key, record);
                    if entry.is_expired_at(now) {
                        debug!("Discarding expired persisted entry {}", key);
                        load.stale_keys.push(key.to_string());
                    } else {
                        load.entries.push(entry);
                    }
                }
                Err(e) => {
                    warn!("Discarding corrupt persisted entry {}: {}", key, e);
                    load.stale_keys.push(key.to_string());
                }
            }
        }

        info!(
            "Durable cache loaded: {} valid, {} stale",
            load.entries.len(),
            load.stale_keys.len()
        );
        load
    }

    // == Persist ==
    /// Writes an entry. Never fails the caller.
    pub async fn persist(&self, entry: &CacheEntry) {
        let json = match entry.to_record().to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode cache entry {}: {}", entry.key, e);
                return;
            }
        };

        if let Err(e) = self.store.set(&self.storage_key(&entry.key), &json).await {
            warn!("Failed to persist cache entry {}: {}", entry.key, e);
        }
    }

    // == Remove ==
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(&self.storage_key(key)).await {
            warn!("Failed to remove persisted entry {}: {}", key, e);
        }
    }

    pub async fn remove_all(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let storage_keys: Vec<String> = keys.iter().map(|k| self.storage_key(k)).collect();
        if let Err(e) = self.store.remove_many(&storage_keys).await {
            warn!("Failed to remove {} persisted entries: {}", keys.len(), e);
        }
    }

    /// Removes every record under the namespace, including ones the index
    /// never loaded.
    pub async fn clear(&self) {
        let storage_keys: Vec<String> = match self.store.get_all(&self.namespace).await {
            Ok(pairs) => pairs.into_iter().map(|(key, _)| key).collect(),
            Err(e) => {
                warn!("Failed to list persisted entries for clearing: {}", e);
                return;
            }
        };
        if storage_keys.is_empty() {
            return;
        }
        if let Err(e) = self.store.remove_many(&storage_keys).await {
            warn!("Failed to clear {} persisted entries: {}", storage_keys.len(), e);
        }
    }
}
