//! Cache Entry Module
//!
//! Defines resolved entries with their validity window, and the versioned
//! record they are persisted as.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Schema version written into every persisted record.
pub const RECORD_VERSION: u32 = 1;

// == Cache Entry ==
/// A resolved URL plus its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Logical resource key (storage path)
    pub key: String,
    /// The resolved, usable URL
    pub url: String,
    /// Resolution timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry resolved now, valid for `ttl`.
    pub fn new(key: impl Into<String>, url: impl Into<String>, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        Self {
            key: key.into(),
            url: url.into(),
            created_at: now,
            expires_at: now.saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so
    /// it stops being served the instant its TTL has fully elapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    /// Returns remaining validity in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    // == Persistence ==
    /// Converts the entry to its durable form.
    pub fn to_record(&self) -> PersistedRecord {
        PersistedRecord {
            version: RECORD_VERSION,
            url: self.url.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }

    /// Rebuilds an entry from a durable record.
    pub fn from_record(key: impl Into<String>, record: PersistedRecord) -> Self {
        Self {
            key: key.into(),
            url: record.url,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

// == Persisted Record ==
/// JSON shape of an entry in the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    /// Absent in legacy records, which are then rejected as stale schema
    #[serde(default)]
    pub version: u32,
    pub url: String,
    pub created_at: u64,
    pub expires_at: u64,
}

impl PersistedRecord {
    /// Parses a stored value, rejecting malformed JSON and foreign schema versions.
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        let record: PersistedRecord =
            serde_json::from_str(raw).map_err(|e| RecordError::Malformed(e.to_string()))?;
        if record.version != RECORD_VERSION {
            return Err(RecordError::UnsupportedVersion(record.version));
        }
        Ok(record)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Why a stored value could not be turned back into an entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("unsupported record version {0}")]
    UnsupportedVersion(u32),
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
