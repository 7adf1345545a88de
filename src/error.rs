//! Error types for the resolution cache
//!
//! Provides unified error handling using thiserror. Per-key resolution
//! failures are values (`ResolveError`), never panics, so batch fan-out can
//! continue past a bad key.

use thiserror::Error;

// == Resolve Error ==
/// Failure to resolve a single key into a usable URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The remote object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The resolver answered with a non-success status
    #[error("Unexpected status {status} for {key}")]
    Status { key: String, status: u16 },

    /// Transport failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// The key can never resolve (empty, malformed)
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The fetch task died without producing a result
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ResolveError {
    /// Returns true if retrying cannot change the outcome.
    pub fn is_permanent(&self) -> bool {
        matches!(self, ResolveError::NotFound(_) | ResolveError::InvalidKey(_))
    }
}

// == Store Error ==
/// Failure of the durable key-value substrate.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

// == Config Error ==
/// Misconfiguration under which no key could ever resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Storage base URL is not configured")]
    MissingBaseUrl,

    #[error("Invalid storage base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid cache configuration: {0}")]
    Invalid(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

// == Cache Error Enum ==
/// Unified error type for the crate's fallible constructors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
