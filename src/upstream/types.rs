//! Upstream request and error types.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// A GET against a source, relative to its base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl UpstreamRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

impl std::fmt::Display for UpstreamRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)?;
        for (i, (k, v)) in self.query.iter().enumerate() {
            write!(f, "{}{}={}", if i == 0 { '?' } else { '&' }, k, v)?;
        }
        Ok(())
    }
}

/// Errors that can occur while fetching from an upstream source.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Network error, timeout, 5xx, 408 or 429. Retried within one fetch.
    #[error("transient failure from {upstream}: {message}")]
    Transient { upstream: String, message: String },

    /// Any other non-2xx status. Not retried.
    #[error("{upstream} rejected the request with HTTP {status}")]
    Rejected { upstream: String, status: u16 },

    /// The body was not the JSON we asked for.
    #[error("could not decode response from {upstream}: {message}")]
    Decode { upstream: String, message: String },

    /// The circuit is open; no network I/O was attempted.
    #[error("circuit open for {upstream}, next trial in {}ms", .retry_in.as_millis())]
    CircuitOpen { upstream: String, retry_in: Duration },

    /// No source with this name is configured.
    #[error("unknown upstream source '{0}'")]
    UnknownSource(String),
}

impl UpstreamError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, UpstreamError::Transient { .. })
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, UpstreamError::CircuitOpen { .. })
    }

    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Transient { .. } => "transient",
            UpstreamError::Rejected { .. } => "rejected",
            UpstreamError::Decode { .. } => "decode",
            UpstreamError::CircuitOpen { .. } => "circuit_open",
            UpstreamError::UnknownSource(_) => "unknown_source",
        }
    }
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Per-source state exposed on the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSnapshot {
    pub name: String,
    pub circuit_state: &'static str,
    pub failure_count: u32,
    pub cooldown_remaining_ms: Option<u64>,
    pub last_cooldown_ms: u64,
    pub calls_in_window: u32,
    pub max_calls: u32,
    pub window_resets_in_ms: u64,
}
