//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when issuing create/replace calls against the
/// Kubernetes API.
///
/// `Conflict` is split out from all other API failures because the
/// reconciler's create-or-replace fallback hinges on it: an optimistic
/// create that hits an existing object of the same name comes back as
/// HTTP 409 and is recovered locally, everything else is transient.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The object already exists (HTTP 409)
    #[error("object already exists: {0}")]
    Conflict(String),

    /// Any other Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[source] kube::Error),
}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 409 => {
                Self::Conflict(response.message.clone())
            }
            other => Self::Api(other),
        }
    }
}

impl ClusterError {
    /// Builds a `ClusterError` from a bare HTTP status code, classified the
    /// same way as a live API response.
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        Self::from(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: message.into(),
            reason: if code == 409 {
                "AlreadyExists".to_string()
            } else {
                "InternalError".to_string()
            },
            code,
        }))
    }
}
