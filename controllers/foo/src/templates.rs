//! Managed-resource templates.
//!
//! The controller renders its ConfigMap and Deployment from two YAML
//! templates loaded once at startup. The deployment template must carry
//! exactly one config-map volume: that volume is the single bind point the
//! reconciler repoints at the rendered ConfigMap's name.

use crate::error::ControllerError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ConfigMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Parsed object templates, cloned per reconcile.
#[derive(Debug, Clone)]
pub struct Templates {
    pub config_map: ConfigMap,
    pub deployment: Deployment,
}

impl Templates {
    /// Load `configmap.yaml` and `deployment.yaml` from a directory.
    pub fn load(dir: &Path) -> Result<Self, ControllerError> {
        info!("Loading templates from {}", dir.display());
        let config_map = fs::read_to_string(dir.join("configmap.yaml"))?;
        let deployment = fs::read_to_string(dir.join("deployment.yaml"))?;
        Self::from_yaml(&config_map, &deployment)
    }

    /// Parse templates from YAML strings and validate their shape.
    pub fn from_yaml(config_map: &str, deployment: &str) -> Result<Self, ControllerError> {
        let config_map: ConfigMap = serde_yaml::from_str(config_map)?;
        let deployment: Deployment = serde_yaml::from_str(deployment)?;
        validate_deployment(&deployment)?;
        Ok(Self {
            config_map,
            deployment,
        })
    }
}

fn validate_deployment(deployment: &Deployment) -> Result<(), ControllerError> {
    let volumes = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .and_then(|pod_spec| pod_spec.volumes.as_deref())
        .unwrap_or_default();

    match volumes {
        [volume] if volume.config_map.is_some() => Ok(()),
        [_] => Err(ControllerError::Template(
            "the deployment template's volume must have a configMap source".to_string(),
        )),
        _ => Err(ControllerError::Template(format!(
            "the deployment template must have exactly one volume, found {}",
            volumes.len()
        ))),
    }
}
