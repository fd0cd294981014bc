//! Metrics collection and exposition.
//!
//! # Metrics
//! - `resilient_call_attempts_total` (counter): attempts by endpoint, outcome
//! - `resilient_call_calls_total` (counter): logical calls by result
//! - `resilient_call_attempt_duration_seconds` (histogram): per-attempt latency
//! - `resilient_call_concurrency_limit` (gauge): current limit per limiter
//! - `resilient_call_in_flight` (gauge): permits held per limiter
//! - `resilient_call_admission_rejected_total` (counter): refused admissions
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; a no-op until a recorder is installed
//! - Prometheus exporter installed only by the binary

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_attempt(endpoint: &str, outcome: &'static str, duration: Duration) {
    counter!(
        "resilient_call_attempts_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "resilient_call_attempt_duration_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_call(result: &'static str) {
    counter!("resilient_call_calls_total", "result" => result).increment(1);
}

pub fn record_limit(limiter: &str, limit: usize) {
    gauge!("resilient_call_concurrency_limit", "limiter" => limiter.to_string()).set(limit as f64);
}

pub fn record_in_flight(limiter: &str, in_flight: usize) {
    gauge!("resilient_call_in_flight", "limiter" => limiter.to_string()).set(in_flight as f64);
}

pub fn record_admission_rejected(limiter: &str) {
    counter!("resilient_call_admission_rejected_total", "limiter" => limiter.to_string())
        .increment(1);
}
