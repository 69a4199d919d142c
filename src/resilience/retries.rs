//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed attempt may be retried
//! - Produce the delay before the next attempt
//!
//! # Design Decisions
//! - Network errors, timeouts, 5xx, 408 and 429 are retryable
//! - Other 4xx responses end the loop immediately
//! - Only the terminal outcome of the whole loop reaches the circuit breaker

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::{calculate_backoff, with_jitter};

/// Bounded retry schedule for one fetch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter: bool,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            jitter: config.jitter,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let delay = calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms);
        if self.jitter {
            with_jitter(delay)
        } else {
            delay
        }
    }
}

/// Whether an HTTP status is worth another attempt.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429) || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_one_two_four_seconds() {
        let policy = RetryPolicy::new(&RetryConfig::default());
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
    }

    #[test]
    fn test_is_retryable_status() {
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(408));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(401));
    }
}
