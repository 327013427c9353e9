//! Bounded retry schedule with exponential backoff.

use std::time::Duration;

/// Attempts and delays for in-process activation retries.
///
/// The delay before attempt `n + 1` is `base_delay * 2^n`, so the default
/// schedule is 1s, 2s, 4s, 8s, 16s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after the failed attempt with zero-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Whether another attempt follows the zero-based `attempt`.
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BASE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        let secs: Vec<u64> = (0..policy.max_attempts)
            .map(|attempt| policy.delay_for(attempt).as_secs())
            .collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 16]);
    }

    #[test]
    fn has_next_stops_at_max_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.has_next(0));
        assert!(policy.has_next(3));
        assert!(!policy.has_next(4));
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.has_next(0));
    }

    #[test]
    fn huge_attempt_index_saturates() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(policy.delay_for(40), Duration::from_secs(u64::from(u32::MAX)));
    }
}
