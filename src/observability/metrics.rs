//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (operations, transfers, skips, RPC calls, HTTP)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `multisend_operations_total` (counter): finalized mass sends by status
//! - `multisend_transfers_total` (counter): settled transfers by kind, outcome
//! - `multisend_wallets_skipped_total` (counter): skipped wallets by reason
//! - `multisend_transfer_duration_seconds` (histogram): submit-to-inclusion latency
//! - `multisend_rpc_requests_total` (counter): JSON-RPC calls by network, method, result
//! - `multisend_http_requests_total` (counter): API requests by route, status
//!
//! Recording without an installed exporter is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_operation(status: &str) {
    ::metrics::counter!("multisend_operations_total", "status" => status.to_string()).increment(1);
}

pub fn record_transfer(kind: &str, outcome: &str, started: Instant) {
    ::metrics::counter!(
        "multisend_transfers_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    ::metrics::histogram!("multisend_transfer_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_wallet_skipped(reason: &str) {
    ::metrics::counter!("multisend_wallets_skipped_total", "reason" => reason.to_string()).increment(1);
}

pub fn record_rpc_request(network: &str, method: &'static str, ok: bool) {
    ::metrics::counter!(
        "multisend_rpc_requests_total",
        "network" => network.to_string(),
        "method" => method,
        "result" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}

pub fn record_http_request(route: &str, status: u16) {
    ::metrics::counter!(
        "multisend_http_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
