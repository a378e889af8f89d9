//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by disposition, status
//! - `edge_request_duration_seconds` (histogram): latency by disposition
//! - `edge_asset_fallbacks_total` (counter): 404 fallback outcomes
//! - `edge_upstream_errors_total` (counter): failed upstream fetches
//!
//! Recording without an installed recorder is a no-op, so handlers call
//! these unconditionally.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(disposition: &'static str, status: u16, start: Instant) {
    counter!("edge_requests_total", "disposition" => disposition, "status" => status.to_string()).increment(1);
    histogram!("edge_request_duration_seconds", "disposition" => disposition).record(start.elapsed().as_secs_f64());
}

pub fn record_fallback(outcome: &'static str) {
    counter!("edge_asset_fallbacks_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream_error() {
    counter!("edge_upstream_errors_total").increment(1);
}
