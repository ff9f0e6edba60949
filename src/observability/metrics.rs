//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by outcome
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency by outcome
//! - `gateway_upstream_calls_total` (counter): upstream calls by index and result
//! - `gateway_upstream_call_duration_seconds` (histogram): per-upstream latency
//! - `gateway_config_reloads_total` (counter): reload attempts by result
//!
//! # Design Decisions
//! - Labels never carry client-controlled strings (method names, ids)
//! - Recording is a no-op until a recorder is installed

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of one inbound request.
pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("gateway_requests_total", "outcome" => outcome).increment(1);
    histogram!("gateway_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record a single upstream call.
pub fn record_upstream_call(index: usize, success: bool, start: Instant) {
    let result = if success { "success" } else { "failure" };
    counter!(
        "gateway_upstream_calls_total",
        "upstream" => index.to_string(),
        "result" => result
    )
    .increment(1);
    histogram!("gateway_upstream_call_duration_seconds", "upstream" => index.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a configuration reload attempt.
pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("gateway_config_reloads_total", "result" => result).increment(1);
}
