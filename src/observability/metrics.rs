//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define engine metrics (in-flight submissions, outcomes, latencies, speedups)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-backend metrics
//!
//! # Metrics
//! - `chainio_tx_in_flight` (gauge): submissions currently inside the engine
//! - `chainio_tx_outcomes_total` (counter): terminal outcomes by backend, outcome
//! - `chainio_broadcast_attempts_total` (counter): broadcast attempts by backend
//! - `chainio_broadcast_failures_total` (counter): failed broadcast attempts
//! - `chainio_fee_speedups_total` (counter): fee escalations applied
//! - `chainio_broadcast_duration_seconds` (histogram): time to mempool acceptance
//! - `chainio_confirmation_duration_seconds` (histogram): time from acceptance to a terminal poll result
//! - `chainio_observed_cache_entries` (gauge): size of the observed-value cache
//! - `chainio_rpc_health` (gauge): 1=healthy, 0=unhealthy
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so library users and tests pay nothing
//! - Labels are backend names or endpoint URLs, never transaction hashes

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and start its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Counts a submission as in flight until dropped.
///
/// Dropping covers every exit path, including a caller abandoning the future.
#[derive(Debug)]
pub struct InFlightGuard {
    backend: &'static str,
}

impl InFlightGuard {
    pub fn new(backend: &'static str) -> Self {
        gauge!("chainio_tx_in_flight", "backend" => backend).increment(1.0);
        Self { backend }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!("chainio_tx_in_flight", "backend" => self.backend).decrement(1.0);
    }
}

pub fn record_broadcast_attempt(backend: &'static str) {
    counter!("chainio_broadcast_attempts_total", "backend" => backend).increment(1);
}

pub fn record_broadcast_failure(backend: &'static str) {
    counter!("chainio_broadcast_failures_total", "backend" => backend).increment(1);
}

/// Record one fee escalation.
pub fn record_speedup(backend: &'static str) {
    counter!("chainio_fee_speedups_total", "backend" => backend).increment(1);
}

pub fn record_broadcast_latency(backend: &'static str, elapsed: Duration) {
    histogram!("chainio_broadcast_duration_seconds", "backend" => backend)
        .record(elapsed.as_secs_f64());
}

pub fn record_confirmation_latency(backend: &'static str, elapsed: Duration) {
    histogram!("chainio_confirmation_duration_seconds", "backend" => backend)
        .record(elapsed.as_secs_f64());
}

/// Record a terminal outcome (`success` or an error kind).
pub fn record_outcome(backend: &'static str, outcome: &'static str) {
    counter!("chainio_tx_outcomes_total", "backend" => backend, "outcome" => outcome)
        .increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("chainio_observed_cache_entries").set(entries as f64);
}

pub fn record_rpc_health(endpoint: &str, healthy: bool) {
    gauge!("chainio_rpc_health", "endpoint" => endpoint.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
