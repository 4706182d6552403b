//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by outcome and response status
//! - `relay_request_duration_seconds` (histogram): handler latency
//! - `relay_upstream_fetch_duration_seconds` (histogram): time to upstream headers
//! - `relay_declared_bytes_total` (counter): declared length of relayed PDFs
//!
//! Recording is a no-op until a recorder is installed, so tests need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished relay request.
pub fn record_request(outcome: &'static str, status: u16, started: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

/// Record the time until upstream response headers arrived.
pub fn record_upstream_fetch(status: u16, started: Instant) {
    metrics::histogram!("relay_upstream_fetch_duration_seconds", "status" => status.to_string())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_declared_bytes(bytes: u64) {
    metrics::counter!("relay_declared_bytes_total").increment(bytes);
}
