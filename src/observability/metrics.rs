//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wallet_rpc_requests_total` (counter): node calls by endpoint, outcome
//! - `wallet_submissions_total` (counter): submissions by outcome
//! - `wallet_submission_duration_seconds` (histogram): submission latency
//! - `wallet_history_details_dropped_total` (counter): detail fetches dropped
//! - `wallet_history_records` (gauge): size of the last reconciled history

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rpc_request(endpoint: &'static str, outcome: &'static str) {
    metrics::counter!(
        "wallet_rpc_requests_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_submission(success: bool, elapsed: Duration) {
    let outcome = if success { "accepted" } else { "rejected" };
    metrics::counter!("wallet_submissions_total", "outcome" => outcome).increment(1);
    metrics::histogram!("wallet_submission_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_history_dropped(dropped: usize) {
    if dropped > 0 {
        metrics::counter!("wallet_history_details_dropped_total").increment(dropped as u64);
    }
}

pub fn record_history_size(records: usize) {
    metrics::gauge!("wallet_history_records").set(records as f64);
}
