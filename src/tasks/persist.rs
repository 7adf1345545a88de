//! Durable Mirror Writer Task
//!
//! Detached writer that applies mirror operations in the order they were
//! queued. Callers never wait on it and never see its errors.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheEntry, DurableMirror};

/// A queued durable-mirror mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOp {
    Persist(CacheEntry),
    Remove(String),
    RemoveMany(Vec<String>),
    /// Drop every record under the mirror's namespace
    Clear,
}

/// Sending half of the writer queue.
#[derive(Debug, Clone)]
pub struct MirrorQueue {
    tx: mpsc::UnboundedSender<MirrorOp>,
}

impl MirrorQueue {
    /// Queues an operation. After the writer has stopped this is a no-op.
    pub fn send(&self, op: MirrorOp) {
        if let Err(e) = self.tx.send(op) {
            debug!("Mirror writer stopped, dropping {:?}", e.0);
        }
    }
}

/// Spawns the writer. It exits once every `MirrorQueue` clone is dropped and
/// the queue has drained.
///
/// # Example
/// ```ignore
/// let (queue, handle) = spawn_mirror_writer(mirror);
/// queue.send(MirrorOp::Remove("covers/1.png".into()));
/// drop(queue);
/// handle.await?; // everything queued has been applied
/// ```
pub fn spawn_mirror_writer(mirror: DurableMirror) -> (MirrorQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<MirrorOp>();

    let handle = tokio::spawn(async move {
        let mut applied = 0u64;
        while let Some(op) = rx.recv().await {
            match op {
                MirrorOp::Persist(entry) => mirror.persist(&entry).await,
                MirrorOp::Remove(key) => mirror.remove(&key).await,
                MirrorOp::RemoveMany(keys) => mirror.remove_all(&keys).await,
                MirrorOp::Clear => mirror.clear().await,
            }
            applied += 1;
        }
        info!("Mirror writer stopped after {} operations", applied);
    });

    (MirrorQueue { tx }, handle)
}
