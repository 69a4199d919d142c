//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Fetch against a source:
//!     → circuit_breaker.rs (fail fast while open, single trial while half-open)
//!     → rate_limit.rs (take a slot in the rolling window, or wait for reset)
//!     → retries.rs + backoff.rs (bounded attempts with exponential delay)
//!     → terminal outcome recorded on the breaker
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline (per-attempt timeout in the transport)
//! - State is per source, never global
//! - Rate limiting delays, it never drops

pub mod backoff;
pub mod circuit_breaker;
pub mod rate_limit;
pub mod retries;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use rate_limit::{RateLimiter, WindowUsage};
pub use retries::RetryPolicy;
