//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the sync relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Upstream data sources, each with its own rate window and circuit.
    pub sources: Vec<SourceConfig>,

    /// Circuit breaker thresholds shared by every source.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Cache layer settings.
    pub cache: CacheConfig,

    /// Sync workers and their cadences.
    pub sync: SyncConfig,

    /// Event fan-out and connection liveness.
    pub distribution: DistributionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            sources: default_sources(),
            circuit_breaker: CircuitBreakerConfig::default(),
            retries: RetryConfig::default(),
            timeouts: TimeoutConfig::default(),
            cache: CacheConfig::default(),
            sync: SyncConfig::default(),
            distribution: DistributionConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Look up a source by name.
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum concurrent subscriber connections.
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            tls: None,
            max_connections: 10_000,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// One upstream source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Source identity, e.g. "mlb".
    pub name: String,

    /// Base URL every request path is joined onto.
    pub base_url: String,

    /// Maximum attempts allowed to begin within one window.
    #[serde(default = "default_max_calls")]
    pub max_calls: u32,

    /// Rolling window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Extra headers sent with every request to this source.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl SourceConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

fn default_max_calls() -> u32 {
    30
}

fn default_window_secs() -> u64 {
    60
}

/// The two upstreams the relay ships with.
pub fn default_sources() -> Vec<SourceConfig> {
    let mut espn_headers = HashMap::new();
    espn_headers.insert(
        "User-Agent".to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".to_string(),
    );
    espn_headers.insert("Referer".to_string(), "https://www.espn.com/".to_string());

    vec![
        SourceConfig {
            name: "mlb".to_string(),
            base_url: "https://statsapi.mlb.com".to_string(),
            max_calls: 30,
            window_secs: 60,
            headers: HashMap::new(),
        },
        SourceConfig {
            name: "espn".to_string(),
            base_url: "https://site.api.espn.com".to_string(),
            max_calls: 50,
            window_secs: 60,
            headers: espn_headers,
        },
    ]
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed fetches before the circuit opens.
    pub failure_threshold: u32,

    /// Cooldown applied when the circuit first opens, in seconds.
    pub base_cooldown_secs: u64,

    /// Largest exponent applied to the base cooldown.
    pub cap_exponent: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            base_cooldown_secs: 60,
            cap_exponent: 5,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per fetch, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Add up to 10% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter: false,
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-attempt request timeout in seconds.
    pub request_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 10,
            connect_secs: 5,
        }
    }
}

/// Cache layer configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON file the cache is restored from on start and saved to on shutdown.
    pub persistence_path: Option<String>,
}

/// Sync worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Run every worker once before the cadences start.
    pub initial_sync: bool,

    /// Start the cadences after the initial sync.
    pub enabled: bool,

    /// Cadence intervals.
    pub cadences: CadenceConfig,

    /// Cache TTLs per domain.
    pub ttl: TtlConfig,

    /// MLB sport id passed to team and schedule endpoints.
    pub mlb_sport_id: u32,

    /// League ids for the MLB standings endpoint.
    pub mlb_standings_leagues: String,

    /// ESPN leagues to sync.
    pub espn_leagues: Vec<LeagueConfig>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            initial_sync: true,
            enabled: true,
            cadences: CadenceConfig::default(),
            ttl: TtlConfig::default(),
            mlb_sport_id: 1,
            mlb_standings_leagues: "103,104".to_string(),
            espn_leagues: default_leagues(),
        }
    }
}

/// An ESPN league.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeagueConfig {
    /// Short key, e.g. "nfl".
    pub key: String,

    /// URL path segment, e.g. "football/nfl".
    pub path: String,

    /// Sport label stored on records, e.g. "NFL".
    pub sport: String,
}

fn default_leagues() -> Vec<LeagueConfig> {
    [
        ("nfl", "football/nfl", "NFL"),
        ("nba", "basketball/nba", "NBA"),
        ("ncaa_football", "football/college-football", "NCAA Football"),
    ]
    .into_iter()
    .map(|(key, path, sport)| LeagueConfig {
        key: key.to_string(),
        path: path.to_string(),
        sport: sport.to_string(),
    })
    .collect()
}

/// Cadence intervals in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub live_secs: u64,
    pub scores_secs: u64,
    pub standings_secs: u64,
    pub rosters_secs: u64,
    pub teams_secs: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            live_secs: 30,
            scores_secs: 5 * 60,
            standings_secs: 60 * 60,
            rosters_secs: 360 * 60,
            teams_secs: 360 * 60,
        }
    }
}

/// Cache TTLs in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TtlConfig {
    pub teams_secs: u64,
    pub scores_secs: u64,
    pub live_secs: u64,
    pub standings_secs: u64,
    pub rosters_secs: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            teams_secs: 3600,
            scores_secs: 300,
            live_secs: 30,
            standings_secs: 3600,
            rosters_secs: 21_600,
        }
    }
}

/// Fan-out configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Liveness probe interval in seconds.
    pub heartbeat_secs: u64,

    /// Bounded capacity of the event bus.
    pub event_bus_capacity: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: 30,
            event_bus_capacity: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}
