//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Perform exactly one attempt against a source
//! - Enforce the per-attempt timeout
//! - Classify the outcome (transient, rejected, decode)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;

use crate::config::{SourceConfig, TimeoutConfig};
use crate::resilience::retries::is_retryable_status;
use crate::upstream::types::{UpstreamError, UpstreamRequest, UpstreamResult};

const RELAY_USER_AGENT: &str = concat!("sync-relay/", env!("CARGO_PKG_VERSION"));

/// A single outbound call. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, source: &SourceConfig, request: &UpstreamRequest) -> UpstreamResult<Value>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &TimeoutConfig) -> UpstreamResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(RELAY_USER_AGENT));

        let timeout = Duration::from_secs(config.request_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(config.connect_secs))
            .build()
            .map_err(|e| UpstreamError::Transient {
                upstream: "http-client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { client, timeout })
    }

    fn url(source: &SourceConfig, request: &UpstreamRequest) -> String {
        format!(
            "{}/{}",
            source.base_url.trim_end_matches('/'),
            request.path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, source: &SourceConfig, request: &UpstreamRequest) -> UpstreamResult<Value> {
        let mut builder = self.client.get(Self::url(source, request)).query(&request.query);
        for (name, value) in &source.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => builder = builder.header(name, value),
                _ => tracing::warn!(source = %source.name, header = %name, "Ignoring invalid source header"),
            }
        }

        let response = builder.send().await.map_err(|e| UpstreamError::Transient {
            upstream: source.name.clone(),
            message: if e.is_timeout() {
                format!("request timeout after {}ms", self.timeout.as_millis())
            } else {
                e.to_string()
            },
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(if is_retryable_status(status.as_u16()) {
                UpstreamError::Transient {
                    upstream: source.name.clone(),
                    message: format!("HTTP {}", status.as_u16()),
                }
            } else {
                UpstreamError::Rejected {
                    upstream: source.name.clone(),
                    status: status.as_u16(),
                }
            });
        }

        response.json::<Value>().await.map_err(|e| UpstreamError::Decode {
            upstream: source.name.clone(),
            message: e.to_string(),
        })
    }
}
