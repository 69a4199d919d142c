//! Resilient sports data sync and real-time distribution.

pub mod admin;
pub mod cache;
pub mod config;
pub mod distribution;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod sync;
pub mod upstream;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::{RelayRuntime, Shutdown};
