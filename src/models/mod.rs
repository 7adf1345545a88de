//! Result models returned by the resolution cache
//!
//! Serializable so the host application can hand them straight to its UI
//! state layer.

pub mod responses;

pub use responses::{BatchReport, FailedKey, ResolveOneResponse, ResolvedKey};
