//! Durable Storage Module
//!
//! String-keyed persistent key-value substrate the durable mirror writes to.
//!
//! # Backends
//! - `MemoryStore`: process-local map, shareable between cache instances
//! - `FileStore`: single JSON document on disk

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StoreError;

/// Asynchronous string to string store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns every pair whose key starts with `prefix`.
    async fn get_all(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    async fn remove_many(&self, keys: &[String]) -> Result<(), StoreError>;
}
