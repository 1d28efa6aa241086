//! Watch feeder and periodic resync.
//!
//! The feeder is the only writer of the Foo cache: it drives the
//! kube_runtime watcher through a reflector and turns every event into a
//! work-queue key. A separate ticker re-enqueues every cached object on a
//! fixed period, so reconciles happen even without real change and the loop
//! self-heals from missed or out-of-order events.

use crate::error::ControllerError;
use controller_core::{ReconcileRequest, WorkQueue};
use crds::Foo;
use futures::StreamExt;
use kube::{Api, ResourceExt};
use kube_runtime::reflector::store::Writer;
use kube_runtime::watcher::Event;
use kube_runtime::{WatchStreamExt, reflector, watcher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};

fn enqueue(queue: &WorkQueue<ReconcileRequest>, foo: &Foo) {
    let Some(namespace) = foo.namespace() else {
        return;
    };
    queue.add(ReconcileRequest::new(namespace, foo.name_any()));
}

/// Runs the watch stream until the controller shuts down.
///
/// Watch errors are logged and the stream keeps going; the watcher re-lists
/// with backoff on its own. Delete notifications are enqueued like any
/// other event so the reconciler observes the key's absence.
pub async fn run_watcher(
    api: Api<Foo>,
    writer: Writer<Foo>,
    queue: Arc<WorkQueue<ReconcileRequest>>,
    synced: Arc<AtomicBool>,
) -> Result<(), ControllerError> {
    info!("Starting Foo watcher");
    let stream = watcher(api, watcher::Config::default()).default_backoff();
    let mut stream = reflector(writer, stream).boxed();

    while let Some(event) = stream.next().await {
        match event {
            Ok(Event::Apply(foo) | Event::InitApply(foo) | Event::Delete(foo)) => {
                enqueue(&queue, &foo);
            }
            Ok(Event::Init) => debug!("Foo watch (re)listing"),
            Ok(Event::InitDone) => {
                if !synced.swap(true, Ordering::SeqCst) {
                    info!("Initial Foo listing complete");
                }
            }
            Err(e) => error!("Foo watch error: {}", e),
        }
    }

    // The reflector stream only ends when the watcher is dropped.
    Err(ControllerError::Watch("Foo watch stream ended".to_string()))
}

/// Re-enqueues every cached Foo on a fixed period.
pub async fn run_resync(
    store: reflector::Store<Foo>,
    queue: Arc<WorkQueue<ReconcileRequest>>,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    // The first tick fires immediately; the watcher's initial listing
    // already enqueued everything.
    interval.tick().await;
    loop {
        interval.tick().await;
        let objects = store.state();
        debug!("Resyncing {} cached Foos", objects.len());
        for foo in objects {
            enqueue(&queue, &foo);
        }
    }
}
