//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_selections_total` (counter): selections by strategy and outcome
//! - `lb_probes_total` (counter): probe results by target and outcome
//! - `lb_target_available` (gauge): 1=available, 0=not available

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Requires a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_selection(strategy: &'static str, hit: bool) {
    let outcome = if hit { "target" } else { "none" };
    ::metrics::counter!("lb_selections_total", "strategy" => strategy, "outcome" => outcome)
        .increment(1);
}

pub fn record_probe(target: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!("lb_probes_total", "target" => target.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_target_availability(target: &str, available: bool) {
    ::metrics::gauge!("lb_target_available", "target" => target.to_string())
        .set(if available { 1.0 } else { 0.0 });
}
