use std::time::Duration;

/// Capped exponential backoff for re-initializing a failing feed.
///
/// `max_attempts` counts consecutive failed feed calls; once that many have
/// failed in a row the caller gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows the `failures`-th consecutive failure:
    /// `base * 2^(failures - 1)`, capped at `max_delay`. Non-decreasing in `failures`.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// True once `failures` consecutive failures consume the budget
    pub fn is_exhausted(&self, failures: u32) -> bool {
        failures >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_until_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
        };

        let delays: Vec<u128> = (1..=6).map(|n| policy.delay_for(n).as_millis()).collect();
        assert_eq!(delays, vec![500, 1000, 2000, 3000, 3000, 3000]);
    }

    #[test]
    fn test_schedule_is_monotonic_for_huge_attempt_counts() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;
        for n in [1, 2, 3, 10, 31, 32, 64, u32::MAX] {
            let delay = policy.delay_for(n);
            assert!(delay >= previous);
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
    }

    #[test]
    fn test_exhaustion_threshold() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
    }
}
