//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Durable store namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "image_url_cache:";

/// Resolution cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long a resolved URL is trusted
    pub ttl: Duration,
    /// Attempts per fetch, including the first one
    pub max_attempts: u32,
    /// Linear backoff base; attempt `n` waits `n * retry_base_delay`
    pub retry_base_delay: Duration,
    /// Prefix for every key written to the durable store
    pub namespace: String,
    /// Background expiry sweep interval, zero disables the task
    pub sweep_interval: Duration,
    /// Retry "not found" like any other failure
    pub retry_not_found: bool,
    /// Base URL of the object storage bucket
    pub base_url: Option<String>,
    /// Per-request timeout against the object storage
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ASSET_CACHE_TTL_SECS` - Entry lifetime in seconds (default: 86400)
    /// - `ASSET_CACHE_MAX_ATTEMPTS` - Attempts per fetch (default: 3)
    /// - `ASSET_CACHE_RETRY_DELAY_MS` - Backoff base in ms (default: 1000)
    /// - `ASSET_CACHE_NAMESPACE` - Durable key prefix (default: `image_url_cache:`)
    /// - `ASSET_CACHE_SWEEP_INTERVAL_SECS` - Sweep frequency, 0 disables (default: 3600)
    /// - `ASSET_CACHE_RETRY_NOT_FOUND` - Retry 404s too (default: false)
    /// - `ASSET_STORAGE_BASE_URL` - Object storage base URL (default: unset)
    /// - `ASSET_STORAGE_TIMEOUT_MS` - Request timeout in ms (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl: env_parse("ASSET_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl),
            max_attempts: env_parse("ASSET_CACHE_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
            retry_base_delay: env_parse("ASSET_CACHE_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            namespace: env::var("ASSET_CACHE_NAMESPACE").unwrap_or(defaults.namespace),
            sweep_interval: env_parse("ASSET_CACHE_SWEEP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            retry_not_found: env_parse("ASSET_CACHE_RETRY_NOT_FOUND")
                .unwrap_or(defaults.retry_not_found),
            base_url: env::var("ASSET_STORAGE_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            request_timeout: env_parse("ASSET_STORAGE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_retry_not_found(mut self, retry: bool) -> Self {
        self.retry_not_found = retry;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Rejects settings under which the cache cannot operate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::Invalid(
                "namespace must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(1000),
            namespace: DEFAULT_NAMESPACE.to_string(),
            sweep_interval: Duration::from_secs(3600),
            retry_not_found: false,
            base_url: None,
            request_timeout: Duration::from_millis(10_000),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
