//! Reconnection policy.
//!
//! Attempt *i* (0-indexed) waits `min(initial * 2^i, max)` before it is made,
//! and at most `max_attempts` attempts are made per reconnection cycle. With
//! the defaults that is 1s, 2s, 4s, 8s, 16s.

use backon::{BackoffBuilder, ExponentialBuilder};
use std::time::Duration;

/// Default number of reconnection attempts per cycle.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay before the first reconnection attempt.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Default cap on any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

/// Bounded exponential backoff for store reconnection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl ReconnectPolicy {
    /// Create a policy.
    ///
    /// `max_attempts` is clamped to at least one, and `max_delay` to at least
    /// `initial_delay`.
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: max_delay.max(initial_delay),
        }
    }

    /// Number of attempts per reconnection cycle.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay sequence for one reconnection cycle, one entry per attempt.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + Send + 'static {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_factor(2.0)
            .with_max_times(self.max_attempts as usize)
            .build()
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(policy: &ReconnectPolicy) -> Vec<u128> {
        policy.delays().map(|d| d.as_millis()).collect()
    }

    #[test]
    fn test_default_schedule() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(millis(&policy), vec![1000, 2000, 4000, 8000, 16000]);
    }

    #[test]
    fn test_schedule_caps_at_max_delay() {
        let policy = ReconnectPolicy::new(7, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY);
        assert_eq!(
            millis(&policy),
            vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]
        );
    }

    #[test]
    fn test_no_attempt_beyond_budget() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delays().count(), 5);
    }

    #[test]
    fn test_custom_schedule() {
        let policy = ReconnectPolicy::new(
            3,
            Duration::from_millis(100),
            Duration::from_millis(250),
        );
        assert_eq!(millis(&policy), vec![100, 200, 250]);
    }

    #[test]
    fn test_new_clamps_inputs() {
        let policy = ReconnectPolicy::new(0, Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(millis(&policy), vec![2000]);
    }
}
