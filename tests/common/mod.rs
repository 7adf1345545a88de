//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use asset_url_cache::{Config, KeyValueStore, ResolutionCache, ResolveError, Resolver};
use async_trait::async_trait;

/// Resolver double that counts calls per key and can be told to fail.
#[derive(Default)]
pub struct CountingResolver {
    calls: Mutex<HashMap<String, u32>>,
    always_fail: HashSet<String>,
    fail_first: HashMap<String, u32>,
    delay: Duration,
}

impl CountingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.always_fail.insert(key.to_string());
        self
    }

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
impl Resolver for CountingResolver {
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

        let flaky = self.fail_first.get(key).is_some_and(|&n| call <= n);
        if self.always_fail.contains(key) || flaky {
            return Err(ResolveError::Network(format!("{} unreachable", key)));
        }
        Ok(format!("https://cdn.test/{}?token={}", key, call))
    }
}

/// Config with no backoff and no background sweep.
pub fn fast_config() -> Config {
    Config::default()
        .with_retry_base_delay(Duration::ZERO)
        .with_sweep_interval(Duration::ZERO)
}

pub async fn start_cache(
    config: Config,
    resolver: Arc<CountingResolver>,
    store: Arc<dyn KeyValueStore>,
) -> ResolutionCache {
    ResolutionCache::init(config, resolver, store)
        .await
        .expect("cache should start")
}
