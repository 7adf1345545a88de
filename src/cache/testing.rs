//! Test doubles shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ResolveError;
use crate::resolver::Resolver;

/// Resolver that answers `https://cdn.test/{key}?n={call}` and counts calls.
#[derive(Default)]
pub struct StubResolver {
    calls: Mutex<HashMap<String, u32>>,
    always_fail: HashSet<String>,
    fail_first: HashMap<String, u32>,
    panics: HashSet<String>,
    delay: Duration,
}

impl StubResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.always_fail.insert(key.to_string());
        self
    }

    /// Panics on every call for `key`.
    pub fn panicking(mut self, key: &str) -> Self {
        self.panics.insert(key.to_string());
        self
    }

    /// Fails the first `times` calls for `key`, then succeeds.
    pub fn flaky(mut self, key: &str, times: u32) -> Self {
        self.fail_first.insert(key.to_string(), times);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self, key: &str) -> u32 {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Resolver for StubResolver {
    async fn resolve(&self, key: &str) -> Result<String, ResolveError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(key.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.panics.contains(key) {
            panic!("resolver blew up on {}", key);
        }

        let flaky = self.fail_first.get(key).is_some_and(|&n| call <= n);
        if self.always_fail.contains(key) || flaky {
            return Err(ResolveError::Network(format!("{} unavailable", key)));
        }
        Ok(format!("https://cdn.test/{}?n={}", key, call))
    }
}
