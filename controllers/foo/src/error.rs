//! Controller-specific error types.
//!
//! These cover startup and feeder failures only. No reconcile error is
//! fatal to the process; those are scoped to a single key's outcome.

use thiserror::Error;

/// Errors that can occur in the Foo controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Template file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Template file could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Template parsed but has the wrong shape
    #[error("Invalid template: {0}")]
    Template(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reconciliation failed
    #[error("Reconciliation failed: {0}")]
    Reconciliation(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
