//! Kubernetes Cluster Client
//!
//! A thin client for the create/replace operations the Foo controller issues
//! against managed resources (ConfigMaps and Deployments). The client
//! classifies API failures so callers can distinguish "already exists"
//! conflicts (HTTP 409) from every other error kind and fall back from
//! create to replace.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClientTrait, KubeClusterClient};
//! use k8s_openapi::api::core::v1::ConfigMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClusterClient::new(kube::Client::try_default().await?);
//! let config_map = ConfigMap::default();
//! client.create_config_map("default", &config_map).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeClusterClient;
pub use cluster_trait::ClusterClientTrait;
pub use error::ClusterError;
#[cfg(feature = "test-util")]
pub use mock::{MockClusterClient, MockOperation, ObjectKind};
