//! Resolution Cache Module
//!
//! Turns storage keys into time-limited URLs. Coordinates the in-memory
//! index, the durable mirror and the resolver so that:
//! - at most one fetch per key is in flight at any instant,
//! - valid entries are served without touching the network,
//! - per-key failures come back as values and never sink a batch.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex as StdMutex};

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::fetch::{fetch_with_retry, RetryPolicy};
use crate::cache::index::{CacheIndex, Lookup};
use crate::cache::{CacheEntry, CacheStats, CacheStatus, DurableMirror};
use crate::config::Config;
use crate::error::{ResolveError, Result};
use crate::models::{BatchReport, ResolveOneResponse};
use crate::resolver::Resolver;
use crate::storage::KeyValueStore;
use crate::tasks::{spawn_mirror_writer, spawn_sweep_task, MirrorOp, MirrorQueue};

/// Settled result of one fetch, shared by every caller that awaited it.
type SharedFetch = Shared<BoxFuture<'static, std::result::Result<String, ResolveError>>>;

/// A resolved URL and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub url: String,
    /// True when served from the index without a fetch
    pub from_cache: bool,
}

struct Inner {
    config: Config,
    policy: RetryPolicy,
    resolver: Arc<dyn Resolver>,
    index: RwLock<CacheIndex>,
    pending: Mutex<HashMap<String, SharedFetch>>,
    stats: StdMutex<CacheStats>,
    mirror_queue: StdMutex<Option<MirrorQueue>>,
    mirror_writer: Mutex<Option<JoinHandle<()>>>,
    sweeper: StdMutex<Option<JoinHandle<()>>>,
}

// == Resolution Cache ==
/// Cloneable handle to the process-wide resolution cache.
///
/// Build exactly one with [`ResolutionCache::init`] at the composition root
/// and hand clones to every caller.
#[derive(Clone)]
pub struct ResolutionCache {
    inner: Arc<Inner>,
}

impl ResolutionCache {
    // == Lifecycle ==
    /// Validates `config`, loads the durable mirror into memory and starts
    /// the background tasks.
    ///
    /// Expired and corrupt persisted records are purged in the background;
    /// startup does not wait for that.
    pub async fn init(
        config: Config,
        resolver: Arc<dyn Resolver>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        config.validate()?;

        let mirror = DurableMirror::new(store, config.namespace.clone());
        let load = mirror.load_all().await;
        let (queue, writer) = spawn_mirror_writer(mirror);
        if !load.stale_keys.is_empty() {
            queue.send(MirrorOp::RemoveMany(load.stale_keys));
        }

        let cache = Self {
            inner: Arc::new(Inner {
                policy: RetryPolicy::from_config(&config),
                resolver,
                index: RwLock::new(CacheIndex::from_entries(load.entries)),
                pending: Mutex::new(HashMap::new()),
                stats: StdMutex::new(CacheStats::new()),
                mirror_queue: StdMutex::new(Some(queue)),
                mirror_writer: Mutex::new(Some(writer)),
                sweeper: StdMutex::new(None),
                config,
            }),
        };

        if !cache.inner.config.sweep_interval.is_zero() {
            let handle = spawn_sweep_task(cache.clone(), cache.inner.config.sweep_interval);
            *lock(&cache.inner.sweeper) = Some(handle);
        }

        info!(
            "Resolution cache ready: {} entries, ttl={:?}",
            cache.status().await.total,
            cache.inner.config.ttl
        );
        Ok(cache)
    }

    /// Stops the sweep task, waits for in-flight fetches to settle and for
    /// every queued durable write to land.
    ///
    /// Resolutions keep working afterwards but are no longer mirrored.
    pub async fn shutdown(&self) {
        if let Some(sweeper) = lock(&self.inner.sweeper).take() {
            sweeper.abort();
        }

        let in_flight: Vec<SharedFetch> = self.inner.pending.lock().await.values().cloned().collect();
        if !in_flight.is_empty() {
            debug!("Waiting for {} in-flight fetches", in_flight.len());
            join_all(in_flight).await;
        }

        drop(lock(&self.inner.mirror_queue).take());
        if let Some(writer) = self.inner.mirror_writer.lock().await.take() {
            if let Err(e) = writer.await {
                warn!("Mirror writer ended abnormally: {}", e);
            }
        }
        info!("Resolution cache shut down");
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    // == Resolve (deduplicated) ==
    /// Resolves one key, sharing a single fetch among concurrent callers.
    ///
    /// Order of checks: an in-flight fetch is joined first, then the index is
    /// consulted, and only then a new fetch is started and registered.
    pub async fn resolve(&self, key: &str) -> std::result::Result<Resolved, ResolveError> {
        if key.trim().is_empty() {
            return Err(ResolveError::InvalidKey("key must not be empty".to_string()));
        }

        let fetch = {
            let mut pending = self.inner.pending.lock().await;

            if let Some(existing) = pending.get(key) {
                debug!("Joining in-flight fetch for {}", key);
                lock(&self.inner.stats).record_join();
                existing.clone()
            } else {
                match self.inner.index.write().await.lookup(key) {
                    Lookup::Hit(entry) => {
                        debug!("Cache hit for {} ({}ms left)", key, entry.ttl_remaining_ms());
                        lock(&self.inner.stats).record_hit();
                        return Ok(Resolved {
                            url: entry.url,
                            from_cache: true,
                        });
                    }
                    Lookup::Expired(entry) => {
                        debug!("Cache entry for {} expired", key);
                        self.inner.enqueue(MirrorOp::Remove(entry.key));
                    }
                    Lookup::Miss => {}
                }

                debug!("Cache miss for {}, fetching", key);
                lock(&self.inner.stats).record_miss();
                let fetch = self.spawn_fetch(key);
                pending.insert(key.to_string(), fetch.clone());
                fetch
            }
        };

        fetch.await.map(|url| Resolved {
            url,
            from_cache: false,
        })
    }

    /// Starts the fetch on its own task so it runs to completion even if
    /// every caller stops waiting. The task unregisters itself when settled.
    fn spawn_fetch(&self, key: &str) -> SharedFetch {
        let inner = Arc::clone(&self.inner);
        let key = key.to_string();

        let handle = tokio::spawn(async move {
            let result = AssertUnwindSafe(inner.fetch(&key))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    error!("Fetch for {} panicked", key);
                    Err(ResolveError::Unexpected(format!("fetch for {} panicked", key)))
                });
            inner.pending.lock().await.remove(&key);
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ResolveError::Unexpected(format!("fetch task failed: {}", e))))
        }
        .boxed()
        .shared()
    }

    // == Public API ==
    /// Resolves one key into a caller-facing result.
    pub async fn resolve_one(&self, key: &str) -> ResolveOneResponse {
        match self.resolve(key).await {
            Ok(resolved) => ResolveOneResponse::resolved(resolved.url, resolved.from_cache),
            Err(e) => ResolveOneResponse::failed(&e),
        }
    }

    // == Batch ==
    /// Resolves every key concurrently and partitions the outcomes.
    ///
    /// Waits for all keys; one failing or panicking key never affects the
    /// others. The report keeps each key paired with its own outcome.
    pub async fn resolve_batch<S: AsRef<str>>(&self, keys: &[S]) -> BatchReport {
        let tasks: Vec<_> = keys
            .iter()
            .map(|key| {
                let cache = self.clone();
                let key = key.as_ref().to_string();
                tokio::spawn(async move { cache.resolve(&key).await })
            })
            .collect();

        let outcomes = join_all(tasks).await;

        let mut report = BatchReport::default();
        for (key, outcome) in keys.iter().zip(outcomes) {
            let key = key.as_ref();
            match outcome {
                Ok(Ok(resolved)) => report.push_success(key, resolved.url, resolved.from_cache),
                Ok(Err(e)) => report.push_failure(key, e.to_string()),
                Err(e) => {
                    error!("Resolution task for {} died: {}", key, e);
                    report.push_failure(key, "Unexpected error while resolving");
                }
            }
        }

        debug!(
            "Batch of {} resolved: {} ok, {} failed",
            keys.len(),
            report.successful.len(),
            report.failed.len()
        );
        report
    }

    // == Maintenance ==
    /// Drops one key, or everything when `key` is `None`.
    ///
    /// The next `resolve` for an invalidated key starts a fresh fetch unless
    /// one was already in flight.
    pub async fn invalidate(&self, key: Option<&str>) {
        // Durable ops are queued under the index write lock so the mirror
        // sees changes in the same order as memory.
        let mut index = self.inner.index.write().await;
        match key {
            Some(key) => {
                index.remove(key);
                self.inner.enqueue(MirrorOp::Remove(key.to_string()));
                debug!("Invalidated {}", key);
            }
            None => {
                let removed = index.clear();
                self.inner.enqueue(MirrorOp::Clear);
                info!("Invalidated all {} cached entries", removed.len());
            }
        }
    }

    /// Removes every expired entry from memory and schedules its durable
    /// removal. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let mut index = self.inner.index.write().await;
        let expired = index.remove_expired();
        let count = expired.len();
        if count > 0 {
            self.inner.enqueue(MirrorOp::RemoveMany(expired));
        }
        count
    }

    /// Counts entries by validity.
    pub async fn status(&self) -> CacheStatus {
        self.inner.index.read().await.status()
    }

    pub fn stats(&self) -> CacheStats {
        lock(&self.inner.stats).clone()
    }
}

impl Inner {
    // == Fetch ==
    /// Resolves with retry; on success records the entry in memory and
    /// queues its durable write.
    async fn fetch(&self, key: &str) -> std::result::Result<String, ResolveError> {
        let outcome = fetch_with_retry(self.resolver.as_ref(), key, self.policy).await;
        lock(&self.stats).record_resolver_calls(outcome.attempts);

        match outcome.result {
            Ok(url) => {
                let entry = CacheEntry::new(key, url.clone(), self.config.ttl);
                let mut index = self.index.write().await;
                index.insert(entry.clone());
                self.enqueue(MirrorOp::Persist(entry));
                Ok(url)
            }
            Err(e) => {
                lock(&self.stats).record_failure();
                Err(e)
            }
        }
    }

    fn enqueue(&self, op: MirrorOp) {
        match lock(&self.mirror_queue).as_ref() {
            Some(queue) => queue.send(op),
            None => debug!("Cache shut down, not mirroring {:?}", op),
        }
    }
}

/// Locks a std mutex, recovering the data if a holder panicked.
fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
