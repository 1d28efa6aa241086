//! Mock cluster client for unit testing
//!
//! This module provides an in-memory implementation of `ClusterClientTrait`
//! that behaves like the API server's create/replace surface without a
//! running cluster: create fails with a 409 conflict when an object of the
//! same name already exists, replace fails with a 404 when it does not.
//! Every call is appended to an operation log so tests can assert on call
//! ordering and counts.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ConfigMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Managed resource kinds the mock distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    ConfigMap,
    Deployment,
}

/// One recorded API call, keyed as `namespace/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Create(ObjectKind, String),
    Replace(ObjectKind, String),
}

/// Mock cluster client for testing
///
/// Stores managed objects in memory and can be configured to fail create
/// calls for a given kind with a specific HTTP status code.
#[derive(Debug, Clone, Default)]
pub struct MockClusterClient {
    config_maps: Arc<Mutex<HashMap<String, ConfigMap>>>,
    deployments: Arc<Mutex<HashMap<String, Deployment>>>,
    operations: Arc<Mutex<Vec<MockOperation>>>,
    create_failures: Arc<Mutex<HashMap<ObjectKind, u16>>>,
}

impl MockClusterClient {
    /// Create a new empty mock client
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(namespace: &str, name: &str) -> String {
        format!("{namespace}/{name}")
    }

    /// Seed a ConfigMap so a subsequent create call conflicts
    pub fn insert_config_map(&self, namespace: &str, name: &str, config_map: ConfigMap) {
        self.config_maps
            .lock()
            .unwrap()
            .insert(Self::key(namespace, name), config_map);
    }

    /// Seed a Deployment so a subsequent create call conflicts
    pub fn insert_deployment(&self, namespace: &str, name: &str, deployment: Deployment) {
        self.deployments
            .lock()
            .unwrap()
            .insert(Self::key(namespace, name), deployment);
    }

    /// Make every create call for `kind` fail with `code` (e.g. 503)
    pub fn fail_creates(&self, kind: ObjectKind, code: u16) {
        self.create_failures.lock().unwrap().insert(kind, code);
    }

    /// All recorded calls, in issue order
    #[must_use]
    pub fn operations(&self) -> Vec<MockOperation> {
        self.operations.lock().unwrap().clone()
    }

    /// Current ConfigMap state, if any
    #[must_use]
    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.config_maps
            .lock()
            .unwrap()
            .get(&Self::key(namespace, name))
            .cloned()
    }

    /// Current Deployment state, if any
    #[must_use]
    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.deployments
            .lock()
            .unwrap()
            .get(&Self::key(namespace, name))
            .cloned()
    }

    fn record(&self, operation: MockOperation) {
        self.operations.lock().unwrap().push(operation);
    }

    fn injected_create_failure(&self, kind: ObjectKind) -> Option<ClusterError> {
        self.create_failures
            .lock()
            .unwrap()
            .get(&kind)
            .map(|code| ClusterError::from_status(*code, "injected create failure"))
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    async fn create_config_map(
        &self,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<ConfigMap, ClusterError> {
        let name = config_map.metadata.name.clone().unwrap_or_default();
        let key = Self::key(namespace, &name);
        self.record(MockOperation::Create(ObjectKind::ConfigMap, key.clone()));
        if let Some(err) = self.injected_create_failure(ObjectKind::ConfigMap) {
            return Err(err);
        }
        let mut store = self.config_maps.lock().unwrap();
        if store.contains_key(&key) {
            return Err(ClusterError::from_status(
                409,
                format!("configmaps \"{name}\" already exists"),
            ));
        }
        store.insert(key, config_map.clone());
        Ok(config_map.clone())
    }

    async fn replace_config_map(
        &self,
        name: &str,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<ConfigMap, ClusterError> {
        let key = Self::key(namespace, name);
        self.record(MockOperation::Replace(ObjectKind::ConfigMap, key.clone()));
        let mut store = self.config_maps.lock().unwrap();
        if !store.contains_key(&key) {
            return Err(ClusterError::from_status(
                404,
                format!("configmaps \"{name}\" not found"),
            ));
        }
        store.insert(key, config_map.clone());
        Ok(config_map.clone())
    }

    async fn create_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        let key = Self::key(namespace, &name);
        self.record(MockOperation::Create(ObjectKind::Deployment, key.clone()));
        if let Some(err) = self.injected_create_failure(ObjectKind::Deployment) {
            return Err(err);
        }
        let mut store = self.deployments.lock().unwrap();
        if store.contains_key(&key) {
            return Err(ClusterError::from_status(
                409,
                format!("deployments.apps \"{name}\" already exists"),
            ));
        }
        store.insert(key, deployment.clone());
        Ok(deployment.clone())
    }

    async fn replace_deployment(
        &self,
        name: &str,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        let key = Self::key(namespace, name);
        self.record(MockOperation::Replace(ObjectKind::Deployment, key.clone()));
        let mut store = self.deployments.lock().unwrap();
        if !store.contains_key(&key) {
            return Err(ClusterError::from_status(
                404,
                format!("deployments.apps \"{name}\" not found"),
            ));
        }
        store.insert(key, deployment.clone());
        Ok(deployment.clone())
    }
}
