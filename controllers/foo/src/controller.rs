//! Main controller implementation.
//!
//! Wires the watch feeder, the Foo cache, the work queue and the worker
//! pool together and runs them until shutdown. Workers are gated behind
//! the cache's initial sync so they never reconcile against a partially
//! populated view.

use crate::error::ControllerError;
use crate::reconciler::FooReconciler;
use crate::store::FooStore;
use crate::templates::Templates;
use crate::watcher::{run_resync, run_watcher};
use cluster_client::KubeClusterClient;
use controller_core::{ReconcileRequest, WorkQueue, WorkerPool, wait_for_cache_sync};
use crds::Foo;
use kube::{Api, Client};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Static controller configuration, read from the environment in `main`.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub namespace: String,
    pub workers: usize,
    pub resync_period: Duration,
    pub template_dir: PathBuf,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            workers: 2,
            resync_period: Duration::from_secs(30),
            template_dir: PathBuf::from("config"),
        }
    }
}

/// Main controller for Foo resource management.
pub struct Controller {
    queue: Arc<WorkQueue<ReconcileRequest>>,
    store: Arc<FooStore>,
    pool: WorkerPool<FooReconciler>,
    watcher: JoinHandle<Result<(), ControllerError>>,
    resync: JoinHandle<()>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller").finish_non_exhaustive()
    }
}

impl Controller {
    /// Creates a new controller instance against the ambient cluster.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing Foo Controller");
        let kube_client = Client::try_default().await?;
        let templates = Templates::load(&config.template_dir)?;
        Ok(Self::with_client(kube_client, templates, config))
    }

    /// Creates a controller from an established client and parsed templates.
    #[must_use]
    pub fn with_client(kube_client: Client, templates: Templates, config: ControllerConfig) -> Self {
        let api: Api<Foo> = Api::namespaced(kube_client.clone(), &config.namespace);
        let (reader, writer) = kube_runtime::reflector::store();
        let synced = Arc::new(AtomicBool::new(false));
        let queue = Arc::new(WorkQueue::new());

        let store = Arc::new(FooStore::new(reader.clone(), Arc::clone(&synced)));
        let foo_store: Arc<dyn controller_core::ObjectStore<Foo>> = store.clone();
        let reconciler = Arc::new(FooReconciler::new(
            foo_store,
            Arc::new(KubeClusterClient::new(kube_client)),
            templates,
        ));
        let pool = WorkerPool::new(Arc::clone(&queue), reconciler, config.workers);

        // Feeder: watch stream into cache + queue, plus the resync ticker
        // that drives level-triggered self-healing.
        let watcher = tokio::spawn(run_watcher(
            api,
            writer,
            Arc::clone(&queue),
            synced,
        ));
        let resync = tokio::spawn(run_resync(reader, Arc::clone(&queue), config.resync_period));

        Self {
            queue,
            store,
            pool,
            watcher,
            resync,
        }
    }

    /// Runs the controller until shutdown.
    ///
    /// On ctrl-c the queue stops accepting new items and workers drain it,
    /// finishing their in-flight reconciles before the pool exits.
    pub async fn run(self) -> Result<(), ControllerError> {
        let Self {
            queue,
            store,
            pool,
            mut watcher,
            resync,
        } = self;

        wait_for_cache_sync(store.as_ref()).await;

        info!("Foo Controller running");
        let workers = tokio::spawn(pool.run());

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, draining work queue");
            }
            result = &mut watcher => {
                match result {
                    Ok(Ok(())) => error!("Foo watcher exited unexpectedly"),
                    Ok(Err(e)) => error!("Foo watcher failed: {}", e),
                    Err(e) => error!("Foo watcher panicked: {}", e),
                }
            }
        }

        queue.shut_down();
        if let Err(e) = workers.await {
            error!("Worker pool task failed: {}", e);
        }
        watcher.abort();
        resync.abort();

        info!("Foo Controller stopped");
        Ok(())
    }
}
