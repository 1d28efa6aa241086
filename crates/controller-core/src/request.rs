//! Work-item key and reconcile outcome types.

use std::fmt;
use std::time::Duration;

/// Identifies which primary resource changed.
///
/// A `ReconcileRequest` is a work-item key, not a resource: multiple rapid
/// changes to the same object collapse to one pending request in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReconcileRequest {
    pub namespace: String,
    pub name: String,
}

impl ReconcileRequest {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ReconcileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Result of a single reconcile invocation.
///
/// Returned synchronously to the worker pool, which uses it to decide the
/// key's next queue placement. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    /// Whether the key should be processed again
    pub requeue: bool,
    /// Explicit delay before the next attempt; `None` with `requeue` set
    /// means the queue's rate limiter picks the delay
    pub requeue_after: Option<Duration>,
}

impl Outcome {
    /// Terminal success: the key is forgotten until the next event.
    #[must_use]
    pub fn done() -> Self {
        Self::default()
    }

    /// Requeue with the queue's rate-limited backoff.
    #[must_use]
    pub fn requeue() -> Self {
        Self {
            requeue: true,
            requeue_after: None,
        }
    }

    /// Requeue after a fixed delay.
    #[must_use]
    pub fn requeue_after(delay: Duration) -> Self {
        Self {
            requeue: true,
            requeue_after: Some(delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_display_is_namespace_slash_name() {
        let request = ReconcileRequest::new("ns1", "my-foo");
        assert_eq!(request.to_string(), "ns1/my-foo");
    }

    #[test]
    fn test_requests_with_same_key_are_equal() {
        assert_eq!(
            ReconcileRequest::new("ns1", "my-foo"),
            ReconcileRequest::new("ns1", "my-foo")
        );
        assert_ne!(
            ReconcileRequest::new("ns1", "my-foo"),
            ReconcileRequest::new("ns2", "my-foo")
        );
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(!Outcome::done().requeue);
        assert!(Outcome::requeue().requeue);
        assert_eq!(
            Outcome::requeue_after(Duration::from_secs(60)).requeue_after,
            Some(Duration::from_secs(60))
        );
    }
}
