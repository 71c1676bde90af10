//! Operation serializer — one lifecycle transition at a time.
//!
//! All mutating operations are funneled through [`OperationSerializer::run`].
//! Tokio's async mutex queues waiters fairly, so operations execute strictly
//! in submission order regardless of how often each one suspends internally.
//! A depth counter makes the busy flag observable while an operation is
//! still queued, not just while it holds the gate.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;

/// Serializes lifecycle operations and exposes a `transitioning` flag.
#[derive(Default)]
pub struct OperationSerializer {
    gate: Mutex<()>,
    depth: AtomicUsize,
}

impl OperationSerializer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while any operation is queued or executing.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }

    /// Run `op` exclusively. A failing operation does not stop later ones
    /// from draining — each caller gets its own result and the gate is
    /// released either way.
    pub async fn run<T>(&self, op: impl Future<Output = T>) -> T {
        let _depth = DepthGuard::new(&self.depth);
        let _gate = self.gate.lock().await;
        op.await
    }
}

/// Keeps the depth counter balanced even if an operation's future is
/// cancelled while queued.
struct DepthGuard<'a> {
    depth: &'a AtomicUsize,
}

impl<'a> DepthGuard<'a> {
    fn new(depth: &'a AtomicUsize) -> Self {
        depth.fetch_add(1, Ordering::SeqCst);
        Self { depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}
