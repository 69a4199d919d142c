//! Resilient fetcher.
//!
//! # Responsibilities
//! - Own one [`SourceState`] (rate window + circuit breaker) per source
//! - Compose circuit gate → rate limiter → bounded retry loop for every fetch
//! - Report only the terminal outcome of a fetch to the breaker
//!
//! # Design Decisions
//! - Every attempt takes a rate-limiter slot, so retries count against the window
//! - A fetch rejected by an open circuit performs no I/O and is not a new failure
//! - A half-open trial that is dropped mid-flight releases its slot

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::time::Instant;

use crate::config::{CircuitBreakerConfig, RelayConfig, RetryConfig, SourceConfig};
use crate::observability::metrics;
use crate::resilience::{CircuitBreaker, CircuitState, RateLimiter, RetryPolicy};
use crate::upstream::transport::Transport;
use crate::upstream::types::{SourceSnapshot, UpstreamError, UpstreamRequest, UpstreamResult};

/// Mutable resilience state for one upstream source.
pub struct SourceState {
    config: SourceConfig,
    limiter: RateLimiter,
    breaker: Mutex<CircuitBreaker>,
}

impl SourceState {
    pub fn new(config: SourceConfig, breaker: &CircuitBreakerConfig) -> Self {
        Self {
            limiter: RateLimiter::new(config.max_calls, config.window()),
            breaker: Mutex::new(CircuitBreaker::new(breaker)),
            config,
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.lock().expect("circuit breaker mutex poisoned").state()
    }

    pub fn failure_count(&self) -> u32 {
        self.breaker.lock().expect("circuit breaker mutex poisoned").failure_count()
    }

    fn snapshot(&self) -> SourceSnapshot {
        let now = Instant::now();
        let breaker = self.breaker.lock().expect("circuit breaker mutex poisoned");
        let usage = self.limiter.usage();
        SourceSnapshot {
            name: self.config.name.clone(),
            circuit_state: breaker.state().as_str(),
            failure_count: breaker.failure_count(),
            cooldown_remaining_ms: breaker.cooldown_remaining(now).map(|d| d.as_millis() as u64),
            last_cooldown_ms: breaker.last_cooldown().as_millis() as u64,
            calls_in_window: usage.calls_in_window,
            max_calls: usage.max_calls,
            window_resets_in_ms: usage.resets_in.as_millis() as u64,
        }
    }
}

/// Releases a half-open trial if the fetch future is dropped before it records an outcome.
struct OutcomeGuard<'a> {
    state: &'a SourceState,
    armed: bool,
}

impl Drop for OutcomeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Ok(mut breaker) = self.state.breaker.lock() {
                breaker.release_trial();
            }
        }
    }
}

/// Fetches from upstream sources through their resilience state.
pub struct SyncCoordinator {
    sources: HashMap<String, Arc<SourceState>>,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl SyncCoordinator {
    pub fn new(
        sources: &[SourceConfig],
        breaker: &CircuitBreakerConfig,
        retries: &RetryConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let sources = sources
            .iter()
            .map(|s| (s.name.clone(), Arc::new(SourceState::new(s.clone(), breaker))))
            .collect();

        Self {
            sources,
            transport,
            retry: RetryPolicy::new(retries),
        }
    }

    pub fn from_config(config: &RelayConfig, transport: Arc<dyn Transport>) -> Self {
        Self::new(&config.sources, &config.circuit_breaker, &config.retries, transport)
    }

    pub fn source(&self, name: &str) -> Option<&Arc<SourceState>> {
        self.sources.get(name)
    }

    /// Fetch a JSON document from a source.
    ///
    /// Fails fast with [`UpstreamError::CircuitOpen`] while the source's circuit is open.
    pub async fn fetch(&self, source: &str, request: &UpstreamRequest) -> UpstreamResult<Value> {
        let state = self
            .sources
            .get(source)
            .ok_or_else(|| UpstreamError::UnknownSource(source.to_string()))?;

        let started = Instant::now();
        {
            let mut breaker = state.breaker.lock().expect("circuit breaker mutex poisoned");
            if let Err(rejected) = breaker.try_acquire(started) {
                metrics::record_circuit_rejection(source);
                tracing::debug!(
                    source = %source,
                    request = %request,
                    retry_in_ms = rejected.retry_in.as_millis() as u64,
                    "Circuit open, failing fast"
                );
                return Err(UpstreamError::CircuitOpen {
                    upstream: source.to_string(),
                    retry_in: rejected.retry_in,
                });
            }
        }

        let mut guard = OutcomeGuard { state, armed: true };
        let result = self.attempt_loop(state, request).await;
        guard.armed = false;

        let circuit_state = {
            let mut breaker = state.breaker.lock().expect("circuit breaker mutex poisoned");
            match &result {
                Ok(_) => breaker.on_success(),
                Err(e) => {
                    if let Some(cooldown) = breaker.on_failure(Instant::now()) {
                        tracing::warn!(
                            source = %source,
                            failures = breaker.failure_count(),
                            cooldown_secs = cooldown.as_secs(),
                            error = %e,
                            "Circuit opened"
                        );
                    }
                }
            }
            breaker.state()
        };

        metrics::record_circuit_state(source, circuit_state.as_gauge());
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_fetch(source, outcome, started.elapsed());

        result
    }

    async fn attempt_loop(&self, state: &SourceState, request: &UpstreamRequest) -> UpstreamResult<Value> {
        let source = state.config.name.as_str();
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;

        loop {
            state.limiter.acquire(source).await;
            metrics::record_attempt(source);

            match self.transport.execute(&state.config, request).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(source = %source, request = %request, attempt, "Fetch succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        source = %source,
                        request = %request,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Fetch attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(source = %source, request = %request, attempt, error = %e, "Fetch failed");
                    return Err(e);
                }
            }
        }
    }

    /// Resilience state of every source, sorted by name.
    pub fn snapshots(&self) -> Vec<SourceSnapshot> {
        let mut out: Vec<_> = self.sources.values().map(|s| s.snapshot()).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}
