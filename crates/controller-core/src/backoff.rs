//! # Fibonacci Backoff
//!
//! Retry delays for failed reconciles follow the Fibonacci sequence, which
//! grows more slowly than exponential backoff and suits operations that may
//! need several retries without overwhelming the API server.
//!
//! With a 1 second minimum the sequence is 1s, 1s, 2s, 3s, 5s, 8s, ...
//! capped at the configured maximum.

use std::time::Duration;

/// Stateless Fibonacci backoff policy.
///
/// The per-key retry count lives in the work queue; this policy only maps
/// an attempt number to a delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FibonacciBackoff {
    /// Delay for the first two attempts
    min: Duration,
    /// Cap applied to the whole sequence
    max: Duration,
}

impl Default for FibonacciBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(300))
    }
}

impl FibonacciBackoff {
    /// Create a policy with the given minimum and maximum delays.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Delay before retry number `attempt` (1-indexed).
    ///
    /// Attempts 0, 1 and 2 all map to the minimum; from there each delay is
    /// the sum of the previous two, capped at the maximum.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 2 {
            return self.min.min(self.max);
        }

        // F(1) = F(2) = 1, in units of `min`
        let mut previous: u32 = 1;
        let mut current: u32 = 1;
        for _ in 3..=attempt {
            let Some(next) = previous.checked_add(current) else {
                return self.max;
            };
            previous = current;
            current = next;
            if self.min.saturating_mul(current) >= self.max {
                return self.max;
            }
        }

        self.min.saturating_mul(current).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_sequence() {
        let backoff = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(300));

        assert_eq!(backoff.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_secs(1));
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_secs(2));
        assert_eq!(backoff.delay_for_attempt(4), Duration::from_secs(3));
        assert_eq!(backoff.delay_for_attempt(5), Duration::from_secs(5));
        assert_eq!(backoff.delay_for_attempt(6), Duration::from_secs(8));
        assert_eq!(backoff.delay_for_attempt(7), Duration::from_secs(13));
    }

    #[test]
    fn test_sequence_caps_at_max() {
        let backoff = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(10));

        assert_eq!(backoff.delay_for_attempt(6), Duration::from_secs(8));
        assert_eq!(backoff.delay_for_attempt(7), Duration::from_secs(10));
        // Stays at max from then on
        assert_eq!(backoff.delay_for_attempt(8), Duration::from_secs(10));
        assert_eq!(backoff.delay_for_attempt(100), Duration::from_secs(10));
    }

    #[test]
    fn test_attempt_zero_gets_min() {
        let backoff = FibonacciBackoff::default();
        assert_eq!(backoff.delay_for_attempt(0), Duration::from_secs(1));
    }
}
