//! Asset URL Cache - resolves storage paths into time-limited URLs
//!
//! Deduplicates concurrent requests per key, retries transient failures,
//! mirrors resolved entries to a durable key-value store and reports batch
//! results as partial success.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod resolver;
pub mod storage;
pub mod tasks;
pub mod telemetry;

pub use cache::{CacheStatus, ResolutionCache};
pub use config::Config;
pub use error::{CacheError, ConfigError, ResolveError, StoreError};
pub use models::{BatchReport, ResolveOneResponse};
pub use resolver::{HttpResolver, Resolver};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use tasks::spawn_sweep_task;
pub use telemetry::init_tracing;
