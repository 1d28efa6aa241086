//! Deduplicating, delay-capable work queue.
//!
//! Decouples event arrival from reconcile execution with the dirty/
//! processing-set discipline: a key that is re-added while pending collapses
//! to one occurrence, and a key re-added while being processed is marked
//! dirty and re-enqueued exactly once after the in-flight run completes.
//! Between `get` and `done` a key is held by exactly one worker, so no two
//! reconciles for the same key ever run concurrently.

use crate::backoff::FibonacciBackoff;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

struct State<K> {
    /// Keys ready to be handed to a worker, in arrival order
    queue: VecDeque<K>,
    /// Keys that need processing: everything queued, plus in-flight keys
    /// that received another event
    dirty: HashSet<K>,
    /// Keys currently held by a worker
    processing: HashSet<K>,
    /// Consecutive rate-limited requeues per key, cleared by `forget`
    retries: HashMap<K, u32>,
    shutting_down: bool,
}

impl<K> Default for State<K> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            dirty: HashSet::new(),
            processing: HashSet::new(),
            retries: HashMap::new(),
            shutting_down: false,
        }
    }
}

/// Work queue with dedup, delayed adds and rate-limited retries.
///
/// Shared by the feeder and all workers; callers never need external
/// locking.
pub struct WorkQueue<K> {
    state: Mutex<State<K>>,
    notify: Notify,
    backoff: FibonacciBackoff,
}

impl<K> std::fmt::Debug for WorkQueue<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl<K> Default for WorkQueue<K>
where
    K: Clone + Eq + Hash + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> WorkQueue<K>
where
    K: Clone + Eq + Hash + Send + 'static,
{
    /// Create a queue with the default retry backoff (1s min, 5m max).
    #[must_use]
    pub fn new() -> Self {
        Self::with_backoff(FibonacciBackoff::default())
    }

    /// Create a queue with a custom retry backoff policy.
    #[must_use]
    pub fn with_backoff(backoff: FibonacciBackoff) -> Self {
        Self {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            backoff,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a key if it is not already pending.
    ///
    /// If the key is currently being processed it is only marked dirty; the
    /// in-flight run's `done` re-enqueues it. No-op after shutdown.
    pub fn add(&self, key: K) {
        {
            let mut state = self.lock();
            if state.shutting_down {
                return;
            }
            if !state.dirty.insert(key.clone()) {
                return;
            }
            if state.processing.contains(&key) {
                return;
            }
            state.queue.push_back(key);
        }
        self.notify.notify_waiters();
    }

    /// Enqueue a key after a delay. Used for backoff.
    pub fn add_after(self: &Arc<Self>, key: K, delay: Duration) {
        if self.lock().shutting_down {
            return;
        }
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(key);
        });
    }

    /// Enqueue a key after a backoff derived from its retry count.
    pub fn add_rate_limited(self: &Arc<Self>, key: K) {
        let attempt = {
            let mut state = self.lock();
            if state.shutting_down {
                return;
            }
            let count = state.retries.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let delay = self.backoff.delay_for_attempt(attempt);
        debug!("Requeueing after {:?} (attempt {})", delay, attempt);
        self.add_after(key, delay);
    }

    /// Wait for the next key.
    ///
    /// The returned key is held by the caller until `done`; the queue will
    /// not hand it to anyone else in between. Returns `None` once the queue
    /// is shut down and drained.
    pub async fn get(&self) -> Option<K> {
        loop {
            // Register interest before checking, so an add between the
            // check and the await still wakes us.
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();
            {
                let mut state = self.lock();
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
                if state.shutting_down {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Mark processing of a key complete.
    ///
    /// If the key was dirtied while in flight it goes back on the queue.
    pub fn done(&self, key: K) {
        let requeued = {
            let mut state = self.lock();
            state.processing.remove(&key);
            if state.dirty.contains(&key) {
                state.queue.push_back(key);
                true
            } else {
                false
            }
        };
        if requeued {
            self.notify.notify_waiters();
        }
    }

    /// Clear the retry counter for a key after a successful reconcile.
    pub fn forget(&self, key: &K) {
        self.lock().retries.remove(key);
    }

    /// Consecutive rate-limited requeues recorded for a key.
    #[must_use]
    pub fn num_requeues(&self, key: &K) -> u32 {
        self.lock().retries.get(key).copied().unwrap_or(0)
    }

    /// Number of keys ready to be handed out (excludes in-flight keys).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting new items and wake blocked getters.
    ///
    /// Already-queued keys are still handed out so workers drain the queue;
    /// in-flight reconciles finish normally.
    pub fn shut_down(&self) {
        self.lock().shutting_down = true;
        self.notify.notify_waiters();
    }
}
