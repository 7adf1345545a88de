//! Cache Module
//!
//! Resolution cache with TTL expiry, request deduplication, retry and a
//! durable mirror that survives restarts.

mod entry;
mod fetch;
mod index;
mod mirror;
mod resolution;
mod stats;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, PersistedRecord, RecordError, RECORD_VERSION};
pub use fetch::{fetch_with_retry, FetchOutcome, RetryPolicy};
pub use index::{CacheIndex, Lookup};
pub use mirror::{DurableMirror, MirrorLoad};
pub use resolution::{ResolutionCache, Resolved};
pub use stats::{CacheStats, CacheStatus};
