//! Reconciliation logic for Foo resources.
//!
//! The reconciler never gets told *what* changed; it looks at the cached
//! Foo and converges the cluster toward it. For each invocation it renders
//! and applies the ConfigMap first and the Deployment second, because the
//! Deployment's volume references the ConfigMap by name. Apply is
//! optimistic create with a replace fallback on 409, relying on the API
//! server's atomic conflict detection instead of check-then-create.
//!
//! Running twice on an unchanged Foo leaves the cluster in the same
//! observable state except for the `bootiful-update` pod annotation, which
//! is refreshed every pass so downstream consumers observe a change even
//! when the rendered content is identical.

use crate::error::ControllerError;
use crate::templates::Templates;
use chrono::Utc;
use cluster_client::{ClusterClientTrait, ClusterError};
use controller_core::{ObjectStore, Outcome, Reconcile, ReconcileRequest};
use crds::Foo;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Coarse circuit breaker applied when a reconcile hits a transient remote
/// error, so a failing key cannot hot-loop.
pub const TRANSIENT_ERROR_BACKOFF: std::time::Duration = std::time::Duration::from_secs(60);

/// Pod-template annotation refreshed on every apply.
const MUTATION_MARKER: &str = "bootiful-update";

const INDEX_HTML_KEY: &str = "index.html";

/// Deterministic ConfigMap name for a Foo.
#[must_use]
pub fn config_map_name(foo_name: &str) -> String {
    format!("configmap-{foo_name}")
}

/// Deterministic Deployment name for a Foo.
#[must_use]
pub fn deployment_name(foo_name: &str) -> String {
    format!("deployment-{foo_name}")
}

/// How one managed resource's apply went.
///
/// A replace failure is deliberately weaker than a transient create
/// failure: the object may need manual correction, and retrying it forever
/// would hot-loop, so it is surfaced via logs instead of a requeue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Created,
    Replaced,
    ReplaceFailed,
    CreateFailed,
}

impl Applied {
    fn is_transient_failure(self) -> bool {
        matches!(self, Self::CreateFailed)
    }
}

/// Reconciles Foo resources into a ConfigMap plus a Deployment.
pub struct FooReconciler {
    store: Arc<dyn ObjectStore<Foo>>,
    client: Arc<dyn ClusterClientTrait>,
    templates: Templates,
}

impl std::fmt::Debug for FooReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FooReconciler").finish_non_exhaustive()
    }
}

impl FooReconciler {
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore<Foo>>,
        client: Arc<dyn ClusterClientTrait>,
        templates: Templates,
    ) -> Self {
        Self {
            store,
            client,
            templates,
        }
    }

    async fn run(&self, request: &ReconcileRequest) -> Result<Outcome, ControllerError> {
        let Some(foo) = self.store.get(request) else {
            // Deleted or not yet observed; owner references make the
            // garbage collector clean up, so nothing to do either way.
            debug!("{} not in cache, skipping", request);
            return Ok(Outcome::done());
        };

        let namespace = foo
            .namespace()
            .unwrap_or_else(|| request.namespace.clone());
        let owner = owner_reference(&foo, &request.name)?;

        // ConfigMap first: the Deployment binds to it by name.
        let config_map = self.render_config_map(&foo, &owner, &request.name);
        let config_map_applied = create_or_replace(
            "ConfigMap",
            request,
            self.client.create_config_map(&namespace, &config_map),
            self.client
                .replace_config_map(&config_map_name(&request.name), &namespace, &config_map),
        )
        .await;

        let deployment = self.render_deployment(&owner, &request.name)?;
        let deployment_applied = create_or_replace(
            "Deployment",
            request,
            self.client.create_deployment(&namespace, &deployment),
            self.client
                .replace_deployment(&deployment_name(&request.name), &namespace, &deployment),
        )
        .await;

        if config_map_applied.is_transient_failure() || deployment_applied.is_transient_failure() {
            Ok(Outcome::requeue_after(TRANSIENT_ERROR_BACKOFF))
        } else {
            Ok(Outcome::done())
        }
    }

    fn render_config_map(&self, foo: &Foo, owner: &OwnerReference, foo_name: &str) -> ConfigMap {
        let mut config_map = self.templates.config_map.clone();
        config_map.metadata.name = Some(config_map_name(foo_name));
        config_map.metadata.owner_references = Some(vec![owner.clone()]);
        let html = format!("<h1> Hello, {} </h1>", foo.spec.name);
        config_map
            .data
            .get_or_insert_with(BTreeMap::new)
            .insert(INDEX_HTML_KEY.to_string(), html);
        config_map
    }

    fn render_deployment(
        &self,
        owner: &OwnerReference,
        foo_name: &str,
    ) -> Result<Deployment, ControllerError> {
        let mut deployment = self.templates.deployment.clone();
        deployment.metadata.name = Some(deployment_name(foo_name));
        deployment.metadata.owner_references = Some(vec![owner.clone()]);

        let spec = deployment.spec.as_mut().ok_or_else(|| {
            ControllerError::Template("deployment template has no spec".to_string())
        })?;

        spec.template
            .metadata
            .get_or_insert_with(Default::default)
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(MUTATION_MARKER.to_string(), Utc::now().to_rfc3339());

        let volumes = spec
            .template
            .spec
            .as_mut()
            .and_then(|pod_spec| pod_spec.volumes.as_mut())
            .ok_or_else(|| {
                ControllerError::Template("deployment template has no volumes".to_string())
            })?;
        // Template validation guarantees a single config-map volume.
        for volume in volumes.iter_mut() {
            if let Some(source) = volume.config_map.as_mut() {
                source.name = config_map_name(foo_name);
            }
        }

        Ok(deployment)
    }
}

fn owner_reference(foo: &Foo, name: &str) -> Result<OwnerReference, ControllerError> {
    let uid = foo.meta().uid.clone().ok_or_else(|| {
        ControllerError::Reconciliation(format!("Foo {} has no uid", name))
    })?;
    Ok(OwnerReference {
        api_version: Foo::api_version(&()).into_owned(),
        kind: Foo::kind(&()).into_owned(),
        name: name.to_string(),
        uid,
        controller: Some(true),
        ..Default::default()
    })
}

/// Optimistic create with replace fallback, best-effort per kind.
///
/// Both futures are lazy; replace is only issued on a 409. A transient
/// create failure skips the replace entirely and is reported upward, while
/// a replace failure after a conflict is only logged.
async fn create_or_replace<T>(
    kind: &str,
    request: &ReconcileRequest,
    create: impl Future<Output = Result<T, ClusterError>>,
    replace: impl Future<Output = Result<T, ClusterError>>,
) -> Applied {
    match create.await {
        Ok(_) => {
            info!("Created {} for {}", kind, request);
            Applied::Created
        }
        Err(ClusterError::Conflict(_)) => {
            info!("{} for {} already exists, replacing", kind, request);
            match replace.await {
                Ok(_) => {
                    info!("Replaced {} for {}", kind, request);
                    Applied::Replaced
                }
                Err(e) => {
                    // May need manual correction; do not retry forever.
                    error!("Failed to replace {} for {}: {}", kind, request, e);
                    Applied::ReplaceFailed
                }
            }
        }
        Err(e) => {
            warn!("Transient error creating {} for {}: {}", kind, request, e);
            Applied::CreateFailed
        }
    }
}

#[async_trait::async_trait]
impl Reconcile for FooReconciler {
    async fn reconcile(&self, request: &ReconcileRequest) -> Outcome {
        match self.run(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Reconcile of {} failed: {}", request, e);
                Outcome::requeue_after(TRANSIENT_ERROR_BACKOFF)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{InMemoryStore, test_foo, test_templates};
    use cluster_client::{MockClusterClient, MockOperation, ObjectKind};

    fn reconciler_with(
        store: InMemoryStore,
        client: &MockClusterClient,
    ) -> FooReconciler {
        FooReconciler::new(Arc::new(store), Arc::new(client.clone()), test_templates())
    }

    fn request() -> ReconcileRequest {
        ReconcileRequest::new("ns1", "my-foo")
    }

    #[tokio::test]
    async fn test_creates_both_managed_resources() {
        let store = InMemoryStore::with(test_foo("ns1", "my-foo", "oh-my", "uid-123"));
        let client = MockClusterClient::new();
        let reconciler = reconciler_with(store, &client);

        let outcome = reconciler.reconcile(&request()).await;
        assert_eq!(outcome, Outcome::done());

        let config_map = client.config_map("ns1", "configmap-my-foo").expect("ConfigMap created");
        let html = config_map.data.as_ref().unwrap().get("index.html").unwrap();
        assert_eq!(html, "<h1> Hello, oh-my </h1>");

        let deployment = client.deployment("ns1", "deployment-my-foo").expect("Deployment created");
        let volumes = deployment
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap()
            .volumes
            .as_ref()
            .unwrap();
        assert_eq!(
            Some(volumes[0].config_map.as_ref().unwrap().name.as_str()),
            Some("configmap-my-foo")
        );

        for owner_refs in [
            config_map.metadata.owner_references.as_ref().unwrap(),
            deployment.metadata.owner_references.as_ref().unwrap(),
        ] {
            assert_eq!(owner_refs.len(), 1);
            assert_eq!(owner_refs[0].uid, "uid-123");
            assert_eq!(owner_refs[0].kind, "Foo");
            assert_eq!(owner_refs[0].name, "my-foo");
            assert_eq!(owner_refs[0].controller, Some(true));
        }
    }

    #[tokio::test]
    async fn test_absent_key_is_terminal_with_no_remote_calls() {
        let store = InMemoryStore::empty();
        let client = MockClusterClient::new();
        let reconciler = reconciler_with(store, &client);

        let outcome = reconciler.reconcile(&request()).await;
        assert_eq!(outcome, Outcome::done());
        assert!(client.operations().is_empty(), "no remote calls for an absent key");
    }

    #[tokio::test]
    async fn test_config_map_applied_before_deployment() {
        let store = InMemoryStore::with(test_foo("ns1", "my-foo", "oh-my", "uid-123"));
        let client = MockClusterClient::new();
        let reconciler = reconciler_with(store, &client);

        reconciler.reconcile(&request()).await;

        let operations = client.operations();
        let config_map_position = operations
            .iter()
            .position(|op| matches!(op, MockOperation::Create(ObjectKind::ConfigMap, _)))
            .unwrap();
        let deployment_position = operations
            .iter()
            .position(|op| matches!(op, MockOperation::Create(ObjectKind::Deployment, _)))
            .unwrap();
        assert!(config_map_position < deployment_position);
    }

    #[tokio::test]
    async fn test_conflict_falls_back_to_a_single_replace() {
        let store = InMemoryStore::with(test_foo("ns1", "my-foo", "oh-my", "uid-123"));
        let client = MockClusterClient::new();
        client.insert_config_map("ns1", "configmap-my-foo", ConfigMap::default());
        let reconciler = reconciler_with(store, &client);

        let outcome = reconciler.reconcile(&request()).await;
        assert_eq!(outcome, Outcome::done());

        let config_map_ops: Vec<_> = client
            .operations()
            .into_iter()
            .filter(|op| {
                matches!(
                    op,
                    MockOperation::Create(ObjectKind::ConfigMap, _)
                        | MockOperation::Replace(ObjectKind::ConfigMap, _)
                )
            })
            .collect();
        assert_eq!(
            config_map_ops,
            vec![
                MockOperation::Create(ObjectKind::ConfigMap, "ns1/configmap-my-foo".to_string()),
                MockOperation::Replace(ObjectKind::ConfigMap, "ns1/configmap-my-foo".to_string()),
            ],
            "create once, replace exactly once"
        );

        // The replaced ConfigMap carries the freshly rendered content
        let config_map = client.config_map("ns1", "configmap-my-foo").unwrap();
        assert_eq!(
            config_map.data.as_ref().unwrap().get("index.html").unwrap(),
            "<h1> Hello, oh-my </h1>"
        );
    }

    #[tokio::test]
    async fn test_deployment_conflict_only() {
        let store = InMemoryStore::with(test_foo("ns1", "my-foo", "oh-my", "uid-123"));
        let client = MockClusterClient::new();
        client.insert_deployment("ns1", "deployment-my-foo", Deployment::default());
        let reconciler = reconciler_with(store, &client);

        let outcome = reconciler.reconcile(&request()).await;
        assert_eq!(outcome, Outcome::done());

        assert!(client.config_map("ns1", "configmap-my-foo").is_some());
        let operations = client.operations();
        assert!(operations.contains(&MockOperation::Replace(
            ObjectKind::Deployment,
            "ns1/deployment-my-foo".to_string()
        )));
    }

    #[tokio::test]
    async fn test_transient_create_failure_requeues_but_continues() {
        let store = InMemoryStore::with(test_foo("ns1", "my-foo", "oh-my", "uid-123"));
        let client = MockClusterClient::new();
        client.fail_creates(ObjectKind::ConfigMap, 503);
        let reconciler = reconciler_with(store, &client);

        let outcome = reconciler.reconcile(&request()).await;
        assert_eq!(outcome, Outcome::requeue_after(TRANSIENT_ERROR_BACKOFF));

        // Best-effort: the Deployment is still attempted and succeeds
        assert!(client.deployment("ns1", "deployment-my-foo").is_some());
        // No replace was attempted for the failed create
        assert!(!client.operations().iter().any(|op| matches!(
            op,
            MockOperation::Replace(ObjectKind::ConfigMap, _)
        )));
    }

    #[tokio::test]
    async fn test_replace_failure_does_not_requeue() {
        let store = InMemoryStore::with(test_foo("ns1", "my-foo", "oh-my", "uid-123"));
        let client = MockClusterClient::new();
        // Injected 409 with nothing seeded: the fallback replace hits a 404
        client.fail_creates(ObjectKind::ConfigMap, 409);
        let reconciler = reconciler_with(store, &client);

        let outcome = reconciler.reconcile(&request()).await;
        // Replace hits 404 (nothing seeded), which is recorded but not
        // escalated; the Deployment side is healthy.
        assert_eq!(outcome, Outcome::done());
        assert!(client.deployment("ns1", "deployment-my-foo").is_some());
    }

    #[tokio::test]
    async fn test_missing_uid_requeues() {
        let mut foo = test_foo("ns1", "my-foo", "oh-my", "uid-123");
        foo.metadata.uid = None;
        let store = InMemoryStore::with(foo);
        let client = MockClusterClient::new();
        let reconciler = reconciler_with(store, &client);

        let outcome = reconciler.reconcile(&request()).await;
        assert_eq!(outcome, Outcome::requeue_after(TRANSIENT_ERROR_BACKOFF));
        assert!(client.operations().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent_modulo_mutation_marker() {
        let store = InMemoryStore::with(test_foo("ns1", "my-foo", "oh-my", "uid-123"));
        let client = MockClusterClient::new();
        let reconciler = reconciler_with(store, &client);

        reconciler.reconcile(&request()).await;
        let first_config_map = client.config_map("ns1", "configmap-my-foo").unwrap();
        let mut first_deployment = client.deployment("ns1", "deployment-my-foo").unwrap();

        reconciler.reconcile(&request()).await;
        let second_config_map = client.config_map("ns1", "configmap-my-foo").unwrap();
        let mut second_deployment = client.deployment("ns1", "deployment-my-foo").unwrap();

        assert_eq!(first_config_map, second_config_map);

        // Only the bootiful-update annotation may differ
        for deployment in [&mut first_deployment, &mut second_deployment] {
            deployment
                .spec
                .as_mut()
                .unwrap()
                .template
                .metadata
                .as_mut()
                .unwrap()
                .annotations
                .as_mut()
                .unwrap()
                .remove("bootiful-update");
        }
        assert_eq!(first_deployment, second_deployment);
    }
}
