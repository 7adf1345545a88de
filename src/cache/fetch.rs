//! Single-Key Fetch Module
//!
//! Resolves one key against the resolver, masking transient failures with a
//! bounded number of attempts and linear backoff.

use std::time::Duration;

use tracing::{error, warn};

use crate::config::Config;
use crate::error::ResolveError;
use crate::resolver::Resolver;

// == Retry Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first, at least 1
    pub max_attempts: u32,
    /// Attempt `n` (1-based) is followed by a wait of `n * base_delay`
    pub base_delay: Duration,
    /// Retry permanent failures such as "not found"
    pub retry_permanent: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.retry_base_delay,
            retry_permanent: config.retry_not_found,
        }
    }

    /// Wait after the given failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    fn should_retry(&self, attempt: u32, err: &ResolveError) -> bool {
        attempt < self.max_attempts && (self.retry_permanent || !err.is_permanent())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Settled fetch and the number of resolver calls it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub result: Result<String, ResolveError>,
    pub attempts: u32,
}

// == Fetch With Retry ==
/// Asks `resolver` for `key` until it succeeds or the policy gives up.
///
/// Failure is returned as a value carrying the last attempt's error.
pub async fn fetch_with_retry(
    resolver: &dyn Resolver,
    key: &str,
    policy: RetryPolicy,
) -> FetchOutcome {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match resolver.resolve(key).await {
            Ok(url) => {
                return FetchOutcome {
                    result: Ok(url),
                    attempts: attempt,
                }
            }
            Err(err) if policy.should_retry(attempt, &err) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "Resolve attempt {}/{} for {} failed: {}; retrying in {:?}",
                    attempt, policy.max_attempts, key, err, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                error!(
                    "Resolving {} failed after {} attempt(s): {}",
                    key, attempt, err
                );
                return FetchOutcome {
                    result: Err(err),
                    attempts: attempt,
                };
            }
        }
    }
}
