//! Result DTOs for the resolution cache
//!
//! Defines the shape of what callers receive from `resolve_one` and
//! `resolve_batch`. Every type serializes to camelCase JSON.

use serde::Serialize;

use crate::error::ResolveError;

/// Outcome of resolving a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOneResponse {
    /// Whether a URL was produced
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when served from the index without any network call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_cache: Option<bool>,
}

impl ResolveOneResponse {
    pub fn resolved(url: impl Into<String>, from_cache: bool) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            error: None,
            from_cache: Some(from_cache),
        }
    }

    pub fn failed(error: &ResolveError) -> Self {
        Self {
            success: false,
            url: None,
            error: Some(error.to_string()),
            from_cache: None,
        }
    }
}

/// A key that resolved within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedKey {
    pub key: String,
    pub url: String,
    pub from_cache: bool,
}

/// A key that failed within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedKey {
    pub key: String,
    pub error: String,
}

/// Partial-success report of a batch resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub successful: Vec<ResolvedKey>,
    pub failed: Vec<FailedKey>,
}

impl BatchReport {
    pub fn push_success(&mut self, key: impl Into<String>, url: impl Into<String>, from_cache: bool) {
        self.successful.push(ResolvedKey {
            key: key.into(),
            url: url.into(),
            from_cache,
        });
    }

    pub fn push_failure(&mut self, key: impl Into<String>, error: impl Into<String>) {
        self.failed.push(FailedKey {
            key: key.into(),
            error: error.into(),
        });
    }

    /// True when no key failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
