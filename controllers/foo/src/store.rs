//! Cache view over the reflector-maintained Foo store.

use controller_core::{ObjectStore, ReconcileRequest};
use crds::Foo;
use kube_runtime::reflector::{self, ObjectRef};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Read side of the watch-fed Foo cache.
///
/// The reflector writer is owned by the feeder; workers only ever read.
/// `synced` is flipped by the feeder when the initial listing completes.
#[derive(Clone)]
pub struct FooStore {
    store: reflector::Store<Foo>,
    synced: Arc<AtomicBool>,
}

impl std::fmt::Debug for FooStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FooStore")
            .field("synced", &self.synced)
            .finish_non_exhaustive()
    }
}

impl FooStore {
    #[must_use]
    pub fn new(store: reflector::Store<Foo>, synced: Arc<AtomicBool>) -> Self {
        Self { store, synced }
    }
}

impl ObjectStore<Foo> for FooStore {
    fn get(&self, key: &ReconcileRequest) -> Option<Arc<Foo>> {
        let object_ref = ObjectRef::new(&key.name).within(&key.namespace);
        self.store.get(&object_ref)
    }

    fn has_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }
}
