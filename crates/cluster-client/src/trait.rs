//! ClusterClient trait for mocking
//!
//! This trait abstracts the Kubernetes create/replace calls so reconciler
//! unit tests can run against an in-memory implementation. The concrete
//! `KubeClusterClient` implements it against a live API server.

use crate::error::ClusterError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ConfigMap;

/// Create/replace operations for the managed resource kinds.
///
/// All methods are `Send` so they work with Tokio's work-stealing runtime.
/// Create is optimistic: callers attempt it first and match on
/// `ClusterError::Conflict` to decide whether to fall back to replace,
/// relying on the API server's atomic create-with-conflict-detection rather
/// than a racy check-then-create.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    /// Creates a ConfigMap in the given namespace.
    async fn create_config_map(
        &self,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<ConfigMap, ClusterError>;

    /// Replaces an existing ConfigMap by name.
    async fn replace_config_map(
        &self,
        name: &str,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<ConfigMap, ClusterError>;

    /// Creates a Deployment in the given namespace.
    async fn create_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError>;

    /// Replaces an existing Deployment by name.
    async fn replace_deployment(
        &self,
        name: &str,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError>;
}
