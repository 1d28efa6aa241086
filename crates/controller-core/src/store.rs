//! Cache view consumed by the reconciler.

use crate::request::ReconcileRequest;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Read-only, eventually consistent view of the watched primary resources.
///
/// Absence of a key is a legitimate, non-error outcome: the object was
/// deleted or has not been observed yet, and the reconciler must treat both
/// the same way (nothing to do, cascade deletion handles cleanup).
pub trait ObjectStore<T>: Send + Sync {
    /// Point lookup by composite key.
    fn get(&self, key: &ReconcileRequest) -> Option<Arc<T>>;

    /// True once the initial full list has been applied to the cache.
    fn has_synced(&self) -> bool;
}

/// Block until the store reports its initial sync is complete.
///
/// Workers must not start reconciling against a partially populated cache,
/// so the controller gates the worker pool behind this.
pub async fn wait_for_cache_sync<T>(store: &dyn ObjectStore<T>) {
    if store.has_synced() {
        return;
    }
    info!("Waiting for initial cache sync");
    let mut interval = tokio::time::interval(Duration::from_millis(100));
    while !store.has_synced() {
        interval.tick().await;
    }
    info!("Cache sync complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubStore {
        synced: AtomicBool,
    }

    impl ObjectStore<String> for StubStore {
        fn get(&self, _key: &ReconcileRequest) -> Option<Arc<String>> {
            None
        }

        fn has_synced(&self) -> bool {
            self.synced.load(Ordering::SeqCst)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_once_synced() {
        let store = Arc::new(StubStore {
            synced: AtomicBool::new(false),
        });

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                wait_for_cache_sync(&*store).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!waiter.is_finished(), "must keep waiting while unsynced");

        store.synced.store(true, Ordering::SeqCst);
        waiter.await.unwrap();
    }
}
