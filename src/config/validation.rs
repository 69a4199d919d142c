//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows, thresholds, intervals > 0)
//! - Check source identities are unique and URLs parse
//! - Check every source a sync worker calls is configured
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{RelayConfig, PLACEHOLDER_API_KEY};

/// Longest rate window or circuit cooldown accepted, in seconds.
pub const MAX_PERIOD_SECS: u64 = 86_400;

/// Largest exponent the circuit cooldown may grow by.
pub const MAX_CAP_EXPONENT: u32 = 16;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("at least one upstream source must be configured")]
    NoSources,

    #[error("source name must not be empty")]
    EmptySourceName,

    #[error("source '{0}' is configured more than once")]
    DuplicateSource(String),

    #[error("source '{name}' has an invalid base_url: {reason}")]
    InvalidBaseUrl { name: String, reason: String },

    #[error("source '{0}' must allow at least one call per window")]
    ZeroMaxCalls(String),

    #[error("source '{0}' must have a window of at least one second")]
    ZeroWindow(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: u64 },

    #[error("sync workers need source '{0}', which is not configured")]
    MissingWorkerSource(String),

    #[error("ESPN league '{0}' has an empty path")]
    EmptyLeaguePath(String),

    #[error("admin API is enabled with the placeholder api_key")]
    PlaceholderApiKey,

    #[error("observability.log_format must be 'pretty' or 'json', got '{0}'")]
    LogFormat(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero("listener.max_connections"));
    }

    if config.sources.is_empty() {
        errors.push(ValidationError::NoSources);
    }
    let mut seen = HashSet::new();
    for source in &config.sources {
        if source.name.trim().is_empty() {
            errors.push(ValidationError::EmptySourceName);
            continue;
        }
        if !seen.insert(source.name.as_str()) {
            errors.push(ValidationError::DuplicateSource(source.name.clone()));
        }
        if let Err(e) = url::Url::parse(&source.base_url) {
            errors.push(ValidationError::InvalidBaseUrl {
                name: source.name.clone(),
                reason: e.to_string(),
            });
        }
        if source.max_calls == 0 {
            errors.push(ValidationError::ZeroMaxCalls(source.name.clone()));
        }
        if source.window_secs == 0 {
            errors.push(ValidationError::ZeroWindow(source.name.clone()));
        } else if source.window_secs > MAX_PERIOD_SECS {
            errors.push(ValidationError::TooLarge {
                field: format!("sources.{}.window_secs", source.name),
                max: MAX_PERIOD_SECS,
            });
        }
    }

    let non_zero: [(&'static str, u64); 10] = [
        ("circuit_breaker.failure_threshold", config.circuit_breaker.failure_threshold as u64),
        ("circuit_breaker.base_cooldown_secs", config.circuit_breaker.base_cooldown_secs),
        ("retries.max_attempts", config.retries.max_attempts as u64),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("distribution.heartbeat_secs", config.distribution.heartbeat_secs),
        ("distribution.event_bus_capacity", config.distribution.event_bus_capacity as u64),
        ("sync.cadences.live_secs", config.sync.cadences.live_secs),
        ("sync.cadences.scores_secs", config.sync.cadences.scores_secs),
        ("sync.cadences.standings_secs", config.sync.cadences.standings_secs),
        ("sync.cadences.rosters_secs", config.sync.cadences.rosters_secs),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }
    if config.circuit_breaker.base_cooldown_secs > MAX_PERIOD_SECS {
        errors.push(ValidationError::TooLarge {
            field: "circuit_breaker.base_cooldown_secs".into(),
            max: MAX_PERIOD_SECS,
        });
    }
    if config.circuit_breaker.cap_exponent > MAX_CAP_EXPONENT {
        errors.push(ValidationError::TooLarge {
            field: "circuit_breaker.cap_exponent".into(),
            max: MAX_CAP_EXPONENT as u64,
        });
    }
    if config.sync.cadences.teams_secs == 0 {
        errors.push(ValidationError::Zero("sync.cadences.teams_secs"));
    }

    if config.sync.enabled || config.sync.initial_sync {
        let mut required = vec!["mlb"];
        if !config.sync.espn_leagues.is_empty() {
            required.push("espn");
        }
        for name in required {
            if config.source(name).is_none() {
                errors.push(ValidationError::MissingWorkerSource(name.to_string()));
            }
        }
    }

    for league in &config.sync.espn_leagues {
        if league.path.trim().is_empty() {
            errors.push(ValidationError::EmptyLeaguePath(league.key.clone()));
        }
    }

    if config.admin.enabled && config.admin.api_key == PLACEHOLDER_API_KEY {
        errors.push(ValidationError::PlaceholderApiKey);
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::LogFormat(other.to_string())),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
