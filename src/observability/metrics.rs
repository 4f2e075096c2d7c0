//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_upstream_failures_total` (counter): exchanges with no status line
//! - `gateway_error_shield_interventions_total` (counter): substituted responses

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one proxied request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an upstream exchange that produced no status line.
pub fn record_upstream_failure(route: &str) {
    metrics::counter!(
        "gateway_upstream_failures_total",
        "route" => route.to_string()
    )
    .increment(1);
}

/// Record one error shield intervention.
pub fn record_intervention(route: &str) {
    metrics::counter!(
        "gateway_error_shield_interventions_total",
        "route" => route.to_string()
    )
    .increment(1);
}
