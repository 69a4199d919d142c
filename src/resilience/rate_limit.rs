//! Per-source call budget over a rolling window.
//!
//! Unlike a token bucket, nothing is ever rejected here: once the budget for
//! the current window is spent, `acquire` parks the caller until the window
//! resets and then lets it through.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::resilience::backoff::deadline_after;

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Granted,
    WaitUntil(Instant),
}

/// Window bookkeeping for one source.
#[derive(Debug)]
pub struct RateWindow {
    calls_in_window: u32,
    window_reset_at: Instant,
    max_calls: u32,
    window: Duration,
}

impl RateWindow {
    pub fn new(max_calls: u32, window: Duration, now: Instant) -> Self {
        Self {
            calls_in_window: 0,
            window_reset_at: deadline_after(now, window),
            max_calls,
            window,
        }
    }

    /// Try to take one slot. The window rolls over once `now` reaches the reset instant.
    pub fn try_acquire(&mut self, now: Instant) -> Admission {
        if now >= self.window_reset_at {
            self.calls_in_window = 0;
            self.window_reset_at = deadline_after(now, self.window);
        }

        if self.calls_in_window < self.max_calls {
            self.calls_in_window += 1;
            Admission::Granted
        } else {
            Admission::WaitUntil(self.window_reset_at)
        }
    }

    pub fn calls_in_window(&self) -> u32 {
        self.calls_in_window
    }

    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    pub fn resets_in(&self, now: Instant) -> Duration {
        self.window_reset_at.saturating_duration_since(now)
    }
}

/// Point-in-time view of a limiter, for the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUsage {
    pub calls_in_window: u32,
    pub max_calls: u32,
    pub resets_in: Duration,
}

/// Async limiter around a [`RateWindow`].
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<RateWindow>,
}

impl RateLimiter {
    pub fn new(max_calls: u32, window: Duration) -> Self {
        Self {
            window: Mutex::new(RateWindow::new(max_calls, window, Instant::now())),
        }
    }

    /// Take one slot, suspending until the window resets if the budget is spent.
    ///
    /// Returns how long the caller was parked.
    pub async fn acquire(&self, source: &str) -> Duration {
        let started = Instant::now();
        loop {
            let admission = {
                let mut window = self.window.lock().expect("rate limiter mutex poisoned");
                window.try_acquire(Instant::now())
            };

            match admission {
                Admission::Granted => return started.elapsed(),
                Admission::WaitUntil(reset_at) => {
                    let wait = reset_at.saturating_duration_since(Instant::now());
                    tracing::info!(
                        source = %source,
                        wait_ms = wait.as_millis() as u64,
                        "Rate limit reached, waiting for window reset"
                    );
                    metrics::record_rate_limit_wait(source);
                    tokio::time::sleep_until(reset_at).await;
                }
            }
        }
    }

    pub fn usage(&self) -> WindowUsage {
        let window = self.window.lock().expect("rate limiter mutex poisoned");
        WindowUsage {
            calls_in_window: window.calls_in_window(),
            max_calls: window.max_calls(),
            resets_in: window.resets_in(Instant::now()),
        }
    }
}
