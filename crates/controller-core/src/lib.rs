//! Reconciliation Core
//!
//! The controller-agnostic machinery for level-triggered reconciliation:
//! a deduplicating, delay-capable work queue, a bounded worker pool, a
//! Fibonacci retry backoff, and the cache-view trait workers read from.
//!
//! The flow is: a feeder turns watch/resync events into `ReconcileRequest`
//! keys on the [`WorkQueue`]; the [`WorkerPool`] pulls keys and invokes a
//! [`Reconcile`] implementation; the returned [`Outcome`] decides whether
//! the key is forgotten or requeued with backoff. The queue guarantees that
//! at most one worker processes a given key at any instant, while an event
//! arriving mid-reconcile marks the key dirty and re-enqueues it exactly
//! once afterwards.

pub mod backoff;
pub mod queue;
pub mod request;
pub mod store;
pub mod worker;

pub use backoff::FibonacciBackoff;
pub use queue::WorkQueue;
pub use request::{Outcome, ReconcileRequest};
pub use store::{ObjectStore, wait_for_cache_sync};
pub use worker::{Reconcile, WorkerPool};
