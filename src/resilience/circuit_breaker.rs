//! Circuit breaker for upstream source protection.
//!
//! # States
//! - Closed: normal operation, fetches pass through
//! - Open: source assumed down, fetches fail fast with no network I/O
//! - Half-Open: exactly one trial fetch is allowed through
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= threshold
//! Open → Half-Open: now >= next_attempt_at
//! Half-Open → Closed: trial fetch succeeds
//! Half-Open → Open: trial fetch fails (cooldown keeps growing)
//! ```
//!
//! Cooldown is `base × 2^min(failure_count − threshold, cap_exponent)`, so it never
//! shrinks while failures keep accumulating and stops growing at the cap.
//!
//! The breaker is a plain state machine driven with explicit instants; the
//! coordinator owns the lock around it.

use std::time::Duration;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::resilience::backoff::deadline_after;

/// Circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }

    /// Gauge value: 0 closed, 1 half-open, 2 open.
    pub fn as_gauge(&self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

/// Why a call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected {
    /// Time until the next trial is allowed (zero while a trial is in flight).
    pub retry_in: Duration,
}

/// Per-source failure tracker.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: CircuitState,
    failure_count: u32,
    next_attempt_at: Option<Instant>,
    last_cooldown: Duration,
    trial_in_flight: bool,
    threshold: u32,
    base_cooldown: Duration,
    cap_exponent: u32,
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            next_attempt_at: None,
            last_cooldown: Duration::ZERO,
            trial_in_flight: false,
            threshold: config.failure_threshold.max(1),
            base_cooldown: Duration::from_secs(config.base_cooldown_secs),
            cap_exponent: config.cap_exponent,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Cooldown applied the last time the circuit opened.
    pub fn last_cooldown(&self) -> Duration {
        self.last_cooldown
    }

    /// Remaining cooldown, if the circuit is open.
    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        match (self.state, self.next_attempt_at) {
            (CircuitState::Open, Some(at)) => Some(at.saturating_duration_since(now)),
            _ => None,
        }
    }

    /// Gate a call. Moves Open → Half-Open once the cooldown has elapsed and
    /// admits exactly one trial while half-open.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Rejected> {
        match self.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let at = self.next_attempt_at.unwrap_or(now);
                if now < at {
                    return Err(Rejected { retry_in: at - now });
                }
                self.state = CircuitState::HalfOpen;
                self.trial_in_flight = true;
                tracing::info!(failures = self.failure_count, "Circuit half-open, admitting trial call");
                Ok(())
            }
            CircuitState::HalfOpen => {
                if self.trial_in_flight {
                    Err(Rejected { retry_in: Duration::ZERO })
                } else {
                    self.trial_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// Record a successful terminal outcome.
    pub fn on_success(&mut self) {
        if self.state != CircuitState::Closed {
            tracing::info!("Circuit closed after successful call");
        }
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.next_attempt_at = None;
        self.trial_in_flight = false;
    }

    /// Record a failed terminal outcome. Returns the cooldown if the circuit (re-)opened.
    pub fn on_failure(&mut self, now: Instant) -> Option<Duration> {
        self.failure_count = self.failure_count.saturating_add(1);
        self.trial_in_flight = false;

        if self.failure_count < self.threshold {
            return None;
        }

        let exponent = (self.failure_count - self.threshold).min(self.cap_exponent);
        let cooldown = self.base_cooldown.saturating_mul(2u32.saturating_pow(exponent));
        self.state = CircuitState::Open;
        self.next_attempt_at = Some(deadline_after(now, cooldown));
        self.last_cooldown = cooldown;
        Some(cooldown)
    }

    /// Release a half-open trial slot without recording an outcome.
    pub fn release_trial(&mut self) {
        self.trial_in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(&CircuitBreakerConfig {
            failure_threshold: 5,
            base_cooldown_secs: 60,
            cap_exponent: 2,
        })
    }

    #[test]
    fn opens_at_threshold() {
        let mut cb = breaker();
        let now = Instant::now();
        for _ in 0..4 {
            assert_eq!(cb.on_failure(now), None);
            assert_eq!(cb.state(), CircuitState::Closed);
        }
        assert_eq!(cb.on_failure(now), Some(Duration::from_secs(60)));
        assert_eq!(cb.state(), CircuitState::Open);

        let rejected = cb.try_acquire(now + Duration::from_secs(10)).unwrap_err();
        assert_eq!(rejected.retry_in, Duration::from_secs(50));
    }

    #[test]
    fn half_open_admits_single_trial() {
        let mut cb = breaker();
        let now = Instant::now();
        for _ in 0..5 {
            cb.on_failure(now);
        }
        let later = now + Duration::from_secs(60);
        assert!(cb.try_acquire(later).is_ok());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.try_acquire(later).is_err());

        cb.on_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.try_acquire(later).is_ok());
    }

    #[test]
    fn cooldown_grows_until_cap_and_never_shrinks() {
        let mut cb = breaker();
        let mut now = Instant::now();
        for _ in 0..4 {
            cb.on_failure(now);
        }

        let mut cooldowns = Vec::new();
        for _ in 0..5 {
            let cooldown = cb.on_failure(now).unwrap();
            cooldowns.push(cooldown);
            now += cooldown;
            cb.try_acquire(now).unwrap();
            assert_eq!(cb.state(), CircuitState::HalfOpen);
        }

        let secs: Vec<u64> = cooldowns.iter().map(|d| d.as_secs()).collect();
        assert_eq!(secs, vec![60, 120, 240, 240, 240]);
    }

    #[test]
    fn success_while_closed_resets_count() {
        let mut cb = breaker();
        let now = Instant::now();
        cb.on_failure(now);
        cb.on_failure(now);
        cb.on_success();
        assert_eq!(cb.failure_count(), 0);
        for _ in 0..4 {
            cb.on_failure(now);
        }
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn huge_cooldown_keeps_circuit_open_without_overflow() {
        let mut cb = CircuitBreaker::new(&CircuitBreakerConfig {
            failure_threshold: 1,
            base_cooldown_secs: i64::MAX as u64,
            cap_exponent: 40,
        });
        let now = Instant::now();
        assert!(cb.on_failure(now).is_some());
        assert!(cb.on_failure(now).is_some());
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.try_acquire(now + Duration::from_secs(86_400)).is_err());
    }
}
