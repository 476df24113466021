//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `dummysite_reconciliations_total{outcome}` - Reconciliations by outcome
//! - `dummysite_reconciliation_errors_total` - Reconciliations that returned an error
//! - `dummysite_reconciliation_duration_seconds` - Duration of reconciliations
//! - `dummysite_fetch_failures_total{kind}` - Failed site content fetches, `transient` or `permanent`

use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "dummysite_reconciliations_total",
            "Total number of reconciliations by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "dummysite_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "dummysite_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static FETCH_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "dummysite_fetch_failures_total",
            "Total number of failed site content fetches by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create FETCH_FAILURES_TOTAL metric - this should never happen")
});

/// Registers every controller metric with [`REGISTRY`]
pub fn register_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(FETCH_FAILURES_TOTAL.clone()))?;
    Ok(())
}

/// Counts a finished reconcile under its outcome label
pub fn increment_reconciliations(outcome: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Counts a reconcile that returned an error
pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

/// Records how long a reconcile took, in seconds
pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

/// Counts a failed fetch; `transient` failures may succeed on a later attempt
pub fn increment_fetch_failures(transient: bool) {
    let kind = if transient { "transient" } else { "permanent" };
    FETCH_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_reconciliations_by_outcome() {
        let before = RECONCILIATIONS_TOTAL.with_label_values(&["deployed"]).get();
        increment_reconciliations("deployed");
        let after = RECONCILIATIONS_TOTAL.with_label_values(&["deployed"]).get();
        assert!(after > before);
    }

    #[test]
    fn test_increment_reconciliation_errors() {
        let before = RECONCILIATION_ERRORS_TOTAL.get();
        increment_reconciliation_errors();
        assert!(RECONCILIATION_ERRORS_TOTAL.get() > before);
    }

    #[test]
    fn test_fetch_failures_split_by_kind() {
        let transient = FETCH_FAILURES_TOTAL.with_label_values(&["transient"]).get();
        let permanent = FETCH_FAILURES_TOTAL.with_label_values(&["permanent"]).get();

        increment_fetch_failures(true);
        assert!(FETCH_FAILURES_TOTAL.with_label_values(&["transient"]).get() > transient);

        increment_fetch_failures(false);
        assert!(FETCH_FAILURES_TOTAL.with_label_values(&["permanent"]).get() > permanent);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        let before = RECONCILIATION_DURATION.get_sample_count();
        observe_reconciliation_duration(0.25);
        assert!(RECONCILIATION_DURATION.get_sample_count() > before);
    }
}
