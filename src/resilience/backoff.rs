//! Exponential backoff with optional jitter.

use std::time::Duration;
use rand::Rng;
use tokio::time::Instant;

/// Stand-in for "never" when a deadline would overflow the clock (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Calculate the delay to wait after the given (1-based) failed attempt.
///
/// Attempt 1 waits `base_ms`, attempt 2 waits `2 * base_ms`, and so on, capped at `max_ms`.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    Duration::from_millis(delay_ms.min(max_ms))
}

/// Add 0 to 10% of random jitter to a delay.
pub fn with_jitter(delay: Duration) -> Duration {
    let delay_ms = delay.as_millis() as u64;
    let jitter_range = delay_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(delay_ms + jitter)
}

/// `now + delay`, clamped to a far-future instant instead of overflowing.
pub fn deadline_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
