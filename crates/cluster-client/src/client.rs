//! Kubernetes-backed cluster client.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::PostParams;
use kube::{Api, Client};
use tracing::debug;

/// Cluster client backed by `kube::Api`.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient").finish_non_exhaustive()
    }
}

impl KubeClusterClient {
    /// Creates a new client from an established Kubernetes connection.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn config_maps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for KubeClusterClient {
    async fn create_config_map(
        &self,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<ConfigMap, ClusterError> {
        debug!("Creating ConfigMap in namespace {}", namespace);
        let api = self.config_maps(namespace);
        Ok(api.create(&PostParams::default(), config_map).await?)
    }

    async fn replace_config_map(
        &self,
        name: &str,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<ConfigMap, ClusterError> {
        debug!("Replacing ConfigMap {}/{}", namespace, name);
        let api = self.config_maps(namespace);
        // Replace is a full PUT; carry over the live resourceVersion so the
        // API server accepts the freshly rendered object.
        let current = api.get(name).await.map_err(ClusterError::from)?;
        let mut desired = config_map.clone();
        desired.metadata.resource_version = current.metadata.resource_version;
        Ok(api.replace(name, &PostParams::default(), &desired).await?)
    }

    async fn create_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        debug!("Creating Deployment in namespace {}", namespace);
        let api = self.deployments(namespace);
        Ok(api.create(&PostParams::default(), deployment).await?)
    }

    async fn replace_deployment(
        &self,
        name: &str,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        debug!("Replacing Deployment {}/{}", namespace, name);
        let api = self.deployments(namespace);
        let current = api.get(name).await.map_err(ClusterError::from)?;
        let mut desired = deployment.clone();
        desired.metadata.resource_version = current.metadata.resource_version;
        Ok(api.replace(name, &PostParams::default(), &desired).await?)
    }
}
