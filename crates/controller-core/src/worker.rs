//! Worker pool dispatching queue keys to the reconciler.

use crate::queue::WorkQueue;
use crate::request::{Outcome, ReconcileRequest};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// The reconcile seam.
///
/// Implementations own no state between invocations: everything is
/// re-derived from the cache and the remote store on each call, which is
/// what makes the loop level-triggered and self-healing. The method is
/// infallible by contract; failures are expressed through the [`Outcome`].
#[async_trait::async_trait]
pub trait Reconcile: Send + Sync {
    async fn reconcile(&self, request: &ReconcileRequest) -> Outcome;
}

/// A fixed-size set of symmetric workers pulling from one work queue.
///
/// Increasing the worker count only raises parallelism across distinct
/// keys; the queue guarantees a single key is never reconciled concurrently.
pub struct WorkerPool<R> {
    queue: Arc<WorkQueue<ReconcileRequest>>,
    reconciler: Arc<R>,
    workers: usize,
}

impl<R> std::fmt::Debug for WorkerPool<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl<R> WorkerPool<R>
where
    R: Reconcile + 'static,
{
    #[must_use]
    pub fn new(queue: Arc<WorkQueue<ReconcileRequest>>, reconciler: Arc<R>, workers: usize) -> Self {
        Self {
            queue,
            reconciler,
            workers,
        }
    }

    /// Run all workers until the queue shuts down and drains.
    ///
    /// In-flight reconciles finish their current key before the pool exits;
    /// there is no mid-reconcile cancellation.
    pub async fn run(self) {
        info!("Starting {} reconcile workers", self.workers);
        let handles: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|worker_id| {
                let queue = Arc::clone(&self.queue);
                let reconciler = Arc::clone(&self.reconciler);
                tokio::spawn(worker_loop(worker_id, queue, reconciler))
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
            }
        }
        info!("All reconcile workers stopped");
    }
}

async fn worker_loop<R: Reconcile>(
    worker_id: usize,
    queue: Arc<WorkQueue<ReconcileRequest>>,
    reconciler: Arc<R>,
) {
    while let Some(key) = queue.get().await {
        debug!("Worker {} reconciling {}", worker_id, key);
        let outcome = reconciler.reconcile(&key).await;
        if outcome.requeue {
            match outcome.requeue_after {
                Some(delay) => queue.add_after(key.clone(), delay),
                None => queue.add_rate_limited(key.clone()),
            }
        } else {
            queue.forget(&key);
        }
        queue.done(key);
    }
    debug!("Worker {} exiting", worker_id);
}
