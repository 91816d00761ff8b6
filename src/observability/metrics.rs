//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_decisions_total` (counter): gate outcomes by `outcome`
//!   (`allowed`, `missing_credential`, `rejected`, `timed_out`)
//! - `gate_verification_duration_seconds` (histogram): delegated check latency
//! - `http_error_responses_total` (counter): responder output by `status`
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_gate_decision(outcome: &'static str) {
    metrics::counter!("gate_decisions_total", "outcome" => outcome).increment(1);
}

pub fn record_verification(elapsed: Duration) {
    metrics::histogram!("gate_verification_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_error_response(status: u16) {
    metrics::counter!("http_error_responses_total", "status" => status.to_string()).increment(1);
}
