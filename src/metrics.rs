//! Prometheus metrics for evaluation monitoring.
//!
//! This module provides metrics for:
//! - Evaluation count and latency
//! - Skipped quotes
//! - Positive-EV results and missing consensus

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Evaluation latency metric name.
pub const METRIC_EVALUATION_LATENCY: &str = "evaluation_latency_ms";
/// Evaluations counter metric name.
pub const METRIC_EVALUATIONS: &str = "evaluations_total";
/// Skipped quotes counter metric name.
pub const METRIC_QUOTES_SKIPPED: &str = "quotes_skipped_total";
/// Positive-EV results counter metric name.
pub const METRIC_POSITIVE_EV_RESULTS: &str = "positive_ev_results_total";
/// Missing consensus counter metric name.
pub const METRIC_NO_CONSENSUS: &str = "no_consensus_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_EVALUATION_LATENCY,
        "Time to evaluate one event's quotes in milliseconds"
    );
    describe_counter!(METRIC_EVALUATIONS, "Total number of evaluations run");
    describe_counter!(
        METRIC_QUOTES_SKIPPED,
        "Total number of raw quotes skipped as malformed"
    );
    describe_counter!(
        METRIC_POSITIVE_EV_RESULTS,
        "Total number of user quotes evaluated with positive EV"
    );
    describe_counter!(
        METRIC_NO_CONSENSUS,
        "Total number of user quotes without a sharp consensus"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and return its render handle.
pub fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record evaluation latency.
pub fn record_evaluation_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_EVALUATION_LATENCY).record(latency_ms);
}

/// Increment evaluations counter.
pub fn inc_evaluations() {
    counter!(METRIC_EVALUATIONS).increment(1);
}

/// Add to the skipped quotes counter.
pub fn add_quotes_skipped(count: u64) {
    counter!(METRIC_QUOTES_SKIPPED).increment(count);
}

/// Add to the positive-EV results counter.
pub fn add_positive_ev_results(count: u64) {
    counter!(METRIC_POSITIVE_EV_RESULTS).increment(count);
}

/// Add to the missing consensus counter.
pub fn add_no_consensus(count: u64) {
    counter!(METRIC_NO_CONSENSUS).increment(count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        init_metrics();
        inc_evaluations();
        add_quotes_skipped(3);
        record_evaluation_latency(Instant::now());
    }
}
