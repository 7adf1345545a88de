//! Background Tasks Module
//!
//! Contains background tasks that run alongside the resolution cache.
//!
//! # Tasks
//! - Expiry sweep: purges expired entries at a configured interval
//! - Mirror writer: applies durable-mirror writes in queue order

mod persist;
mod sweep;

pub use persist::{spawn_mirror_writer, MirrorOp, MirrorQueue};
pub use sweep::spawn_sweep_task;
