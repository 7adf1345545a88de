//! In-Memory Index Module
//!
//! Authoritative working set of resolved entries for the process lifetime.

use std::collections::HashMap;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStatus};

/// Outcome of looking a key up in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Valid entry, safe to serve
    Hit(CacheEntry),
    /// Entry was present but expired; it has been dropped from memory
    Expired(CacheEntry),
    Miss,
}

// == Cache Index ==
/// Key to entry mapping with read-time expiry enforcement.
#[derive(Debug, Default)]
pub struct CacheIndex {
    entries: HashMap<String, CacheEntry>,
}

impl CacheIndex {
    /// Seeds the index from entries loaded out of the durable mirror.
    pub fn from_entries(entries: impl IntoIterator<Item = CacheEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.key.clone(), e)).collect(),
        }
    }

    // == Lookup ==
    /// Returns the entry for `key` if it is still valid.
    ///
    /// Expired entries are removed on the spot and handed back so the caller
    /// can purge them from the durable mirror too.
    pub fn lookup(&mut self, key: &str) -> Lookup {
        match self.entries.get(key) {
            None => return Lookup::Miss,
            Some(entry) if !entry.is_expired() => return Lookup::Hit(entry.clone()),
            Some(_) => {}
        }

        match self.entries.remove(key) {
            Some(expired) => Lookup::Expired(expired),
            None => Lookup::Miss,
        }
    }

    // == Insert ==
    /// Stores an entry, replacing any previous one for the same key.
    pub fn insert(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    /// Empties the index, returning the keys that were present.
    pub fn clear(&mut self) -> Vec<String> {
        self.entries.drain().map(|(key, _)| key).collect()
    }

    // == Remove Expired ==
    /// Removes all expired entries and returns their keys.
    pub fn remove_expired(&mut self) -> Vec<String> {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
        }

        expired_keys
    }

    // == Status ==
    /// Counts entries by validity without mutating anything.
    pub fn status(&self) -> CacheStatus {
        let now = current_timestamp_ms();
        let expired = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .count();

        CacheStatus {
            total: self.entries.len(),
            valid: self.entries.len() - expired,
            expired,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry_expiring_at(key: &str, expires_at: u64) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            url: format!("https://cdn/{}", key),
            created_at: 0,
            expires_at,
        }
    }

    fn live(key: &str) -> CacheEntry {
        entry_expiring_at(key, u64::MAX)
    }

    fn dead(key: &str) -> CacheEntry {
        entry_expiring_at(key, 1)
    }

    #[test]
    fn test_index_default_is_empty() {
        let index = CacheIndex::default();
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let mut index = CacheIndex::default();
        index.insert(live("a"));

        assert_eq!(index.lookup("a"), Lookup::Hit(live("a")));
        assert_eq!(index.lookup("b"), Lookup::Miss);
    }

    #[test]
    fn test_lookup_drops_expired() {
        let mut index = CacheIndex::from_entries(vec![dead("old")]);

        assert_eq!(index.lookup("old"), Lookup::Expired(dead("old")));
        assert!(index.is_empty());
        assert_eq!(index.lookup("old"), Lookup::Miss);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut index = CacheIndex::default();
        index.insert(dead("a"));
        index.insert(live("a"));

        assert_eq!(index.len(), 1);
        assert!(matches!(index.lookup("a"), Lookup::Hit(_)));
    }

    #[test]
    fn test_remove_expired() {
        let mut index = CacheIndex::from_entries(vec![live("a"), dead("b"), dead("c")]);

        let mut removed = index.remove_expired();
        removed.sort();

        assert_eq!(removed, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_status_counts() {
        let index = CacheIndex::from_entries(vec![live("a"), live("b"), dead("c")]);

        assert_eq!(
            index.status(),
            CacheStatus {
                total: 3,
                valid: 2,
                expired: 1
            }
        );
    }

    #[test]
    fn test_clear_returns_keys() {
        let mut index = CacheIndex::from_entries(vec![live("a"), dead("b")]);

        let mut keys = index.clear();
        keys.sort();

        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert!(index.is_empty());
    }
}
