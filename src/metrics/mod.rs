//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Gateway calls per operation and outcome
//! - Transaction submissions
//! - Nonce lookups
//! - Finality polling outcomes and latency

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    // Gateway metrics
    pub static ref GATEWAY_REQUESTS: CounterVec = register_counter_vec!(
        "circular_gateway_requests_total",
        "Total gateway requests by operation and outcome",
        &["operation", "outcome"]
    ).unwrap();

    // Transaction metrics
    pub static ref TX_SUBMITTED: CounterVec = register_counter_vec!(
        "circular_transactions_submitted_total",
        "Total transactions that reached the gateway",
        &["tx_type"]
    ).unwrap();

    pub static ref TX_UNREACHABLE: CounterVec = register_counter_vec!(
        "circular_transactions_unreachable_total",
        "Total transactions that could not reach the gateway",
        &["tx_type"]
    ).unwrap();

    pub static ref NONCE_LOOKUPS: CounterVec = register_counter_vec!(
        "circular_nonce_lookups_total",
        "Total wallet nonce lookups by outcome",
        &["outcome"]
    ).unwrap();

    // Finality metrics
    pub static ref POLL_OUTCOMES: CounterVec = register_counter_vec!(
        "circular_finality_polls_total",
        "Total finality polls by terminal state",
        &["outcome"]
    ).unwrap();

    pub static ref POLL_LATENCY: HistogramVec = register_histogram_vec!(
        "circular_finality_latency_seconds",
        "Time from poll start to terminal state",
        &["outcome"],
        vec![1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    ).unwrap();
}

/// Render all registered metrics in the Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

// Helper functions to record metrics

pub fn record_gateway_request(operation: &str, outcome: &str) {
    GATEWAY_REQUESTS
        .with_label_values(&[operation, outcome])
        .inc();
}

pub fn record_tx_submitted(tx_type: &str) {
    TX_SUBMITTED.with_label_values(&[tx_type]).inc();
}

pub fn record_tx_unreachable(tx_type: &str) {
    TX_UNREACHABLE.with_label_values(&[tx_type]).inc();
}

pub fn record_nonce_lookup(found: bool) {
    NONCE_LOOKUPS
        .with_label_values(&[if found { "found" } else { "missing" }])
        .inc();
}

pub fn record_poll_outcome(outcome: &str, latency_secs: f64) {
    POLL_OUTCOMES.with_label_values(&[outcome]).inc();
    POLL_LATENCY
        .with_label_values(&[outcome])
        .observe(latency_secs);
}
