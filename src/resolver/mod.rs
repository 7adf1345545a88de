//! Resolver Module
//!
//! Boundary to the remote object storage that turns a key into a URL.

mod http;

pub use http::HttpResolver;

use async_trait::async_trait;

use crate::error::ResolveError;

/// Resolves a storage key into a usable URL.
///
/// One call is one attempt; retrying is the cache's job.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, key: &str) -> Result<String, ResolveError>;
}
