//! Attach retry policy.

/// Exponential backoff for capture attachment.
///
/// Attempts are 0-indexed. The delay before retrying after attempt `n` failed
/// is `min(base * 2^n, max)`; no retry follows the last allowed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 500,
            max_delay_ms: 4_000,
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay for `attempt`, ignoring the attempt limit.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> u64 {
        let factor = 1_u64.checked_shl(attempt).unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    /// Delay before the attempt following a failed `attempt`, or `None` when
    /// the retry budget is exhausted.
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Option<u64> {
        (attempt + 1 < self.max_attempts).then(|| self.backoff_delay(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), 500);
        assert_eq!(policy.backoff_delay(1), 1_000);
        assert_eq!(policy.backoff_delay(3), 4_000);
        assert_eq!(policy.backoff_delay(10), 4_000);
        assert_eq!(policy.backoff_delay(200), 4_000);
    }

    #[test]
    fn three_attempts_total() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(0), Some(500));
        assert_eq!(policy.next_delay(1), Some(1_000));
        assert_eq!(policy.next_delay(2), None);
    }
}
