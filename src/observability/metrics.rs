//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_upstream_fetch_total` (counter): terminal fetch outcomes by source
//! - `relay_upstream_fetch_duration_seconds` (histogram): whole-fetch latency
//! - `relay_circuit_state` (gauge): 0 closed, 1 half-open, 2 open
//! - `relay_active_connections` (gauge): open subscriber connections
//! - `relay_events_delivered_total` (counter): per-connection deliveries
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_fetch(source: &str, outcome: &'static str, elapsed: Duration) {
    counter!("relay_upstream_fetch_total", "source" => source.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("relay_upstream_fetch_duration_seconds", "source" => source.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_attempt(source: &str) {
    counter!("relay_upstream_attempts_total", "source" => source.to_string()).increment(1);
}

pub fn record_circuit_rejection(source: &str) {
    counter!("relay_circuit_rejections_total", "source" => source.to_string()).increment(1);
}

pub fn record_circuit_state(source: &str, value: f64) {
    gauge!("relay_circuit_state", "source" => source.to_string()).set(value);
}

pub fn record_rate_limit_wait(source: &str) {
    counter!("relay_rate_limit_waits_total", "source" => source.to_string()).increment(1);
}

pub fn record_cache_read(result: &'static str) {
    counter!("relay_cache_reads_total", "result" => result).increment(1);
}

pub fn record_cache_size(size: usize) {
    gauge!("relay_cache_entries").set(size as f64);
}

pub fn record_event_published(kind: &'static str) {
    counter!("relay_events_published_total", "kind" => kind).increment(1);
}

pub fn record_event_delivered(kind: &'static str, deliveries: usize) {
    counter!("relay_events_delivered_total", "kind" => kind).increment(deliveries as u64);
}

pub fn record_protocol_error() {
    counter!("relay_protocol_errors_total").increment(1);
}

pub fn record_active_connections(count: usize) {
    gauge!("relay_active_connections").set(count as f64);
}

pub fn record_heartbeat_termination() {
    counter!("relay_heartbeat_terminations_total").increment(1);
}

pub fn record_tick_skipped(cadence: &str) {
    counter!("relay_ticks_skipped_total", "cadence" => cadence.to_string()).increment(1);
}
