//! Prometheus metrics for the admin layer.
//!
//! Metrics cover:
//! - Fan-out requests (count and latency per operation, logical outcome)
//! - Partition-level failures (fatal and tolerated, per error kind)
//! - Partition-count lifecycle (creates, updates, deletes)
//! - Name validation rejections per rule
//!
//! All metrics are registered to a custom registry with the
//! "partition_admin" prefix. Registration errors are logged and the
//! unregistered metric is used instead of panicking.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Registry, TextEncoder, opts,
};
use tracing::warn;

/// Custom Prometheus registry for admin metrics.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    Registry::new_custom(Some("partition_admin".to_string()), None)
        .unwrap_or_else(|_| Registry::new())
});

// =============================================================================
// Metric Declaration Macros
// =============================================================================

/// Declare an IntCounterVec metric with labels.
macro_rules! define_counter_vec {
    ($name:ident, $metric_name:expr, $help:expr, [$($label:expr),+ $(,)?]) => {
        #[doc = $help]
        pub static $name: Lazy<IntCounterVec> = Lazy::new(|| {
            register_int_counter_vec_safe(&REGISTRY, $metric_name, $help, &[$($label),+])
        });
    };
}

/// Declare a HistogramVec metric with labels and buckets.
macro_rules! define_histogram_vec {
    ($name:ident, $metric_name:expr, $help:expr, [$($label:expr),+ $(,)?], [$($bucket:expr),+ $(,)?]) => {
        #[doc = $help]
        pub static $name: Lazy<HistogramVec> = Lazy::new(|| {
            register_histogram_vec_safe(&REGISTRY, $metric_name, $help, &[$($label),+], vec![$($bucket),+])
        });
    };
}

// =============================================================================
// Fan-out metrics
// =============================================================================

define_counter_vec!(
    FANOUT_REQUESTS,
    "fanout_requests_total",
    "Total number of fan-out requests by logical outcome",
    ["operation", "outcome"]
);
define_counter_vec!(
    PARTITION_FAILURES,
    "partition_failures_total",
    "Partition operations that failed the logical request",
    ["operation", "kind"]
);
define_counter_vec!(
    TOLERATED_FAILURES,
    "tolerated_partition_failures_total",
    "Partition failures absorbed by the reduction policy",
    ["operation", "kind"]
);
define_histogram_vec!(
    FANOUT_DURATION,
    "fanout_duration_seconds",
    "Time from dispatch until every partition completed",
    ["operation"],
    [0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
);

// =============================================================================
// Lifecycle metrics
// =============================================================================

define_counter_vec!(
    PARTITION_COUNT_UPDATES,
    "partition_count_updates_total",
    "Partition metadata mutations by operation and outcome",
    ["operation", "outcome"]
);

// =============================================================================
// Validation metrics
// =============================================================================

define_counter_vec!(
    NAME_VALIDATION_REJECTIONS,
    "name_validation_rejections_total",
    "Topic creations or updates rejected by naming rules",
    ["rule"]
);

// =============================================================================
// Safe Registration Helpers
// =============================================================================

fn register_int_counter_vec_safe(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> IntCounterVec {
    let counter =
        IntCounterVec::new(opts!(name, help), labels).expect("metric opts should be valid");
    match registry.register(Box::new(counter.clone())) {
        Ok(()) => counter,
        Err(e) => {
            warn!(name, error = %e, "Failed to register IntCounterVec metric, using unregistered fallback");
            counter
        }
    }
}

fn register_histogram_vec_safe(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
    buckets: Vec<f64>,
) -> HistogramVec {
    let histogram = HistogramVec::new(HistogramOpts::new(name, help).buckets(buckets), labels)
        .expect("metric opts should be valid");
    match registry.register(Box::new(histogram.clone())) {
        Ok(()) => histogram,
        Err(e) => {
            warn!(name, error = %e, "Failed to register HistogramVec metric, using unregistered fallback");
            histogram
        }
    }
}

/// Force registration of every metric so they appear before first use.
pub fn init_metrics() {
    let _ = &*FANOUT_REQUESTS;
    let _ = &*PARTITION_FAILURES;
    let _ = &*TOLERATED_FAILURES;
    let _ = &*FANOUT_DURATION;
    let _ = &*PARTITION_COUNT_UPDATES;
    let _ = &*NAME_VALIDATION_REJECTIONS;
}

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record the logical outcome and latency of one fan-out.
pub fn record_fanout(operation: &str, outcome: &str, duration_secs: f64) {
    FANOUT_REQUESTS
        .with_label_values(&[operation, outcome])
        .inc();
    FANOUT_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

/// Record a partition failure; `tolerated` selects the counter.
pub fn record_partition_failure(operation: &str, kind: &str, tolerated: bool) {
    let counter = if tolerated {
        &TOLERATED_FAILURES
    } else {
        &PARTITION_FAILURES
    };
    counter.with_label_values(&[operation, kind]).inc();
}

/// Record a partition metadata mutation.
pub fn record_partition_count_update(operation: &str, outcome: &str) {
    PARTITION_COUNT_UPDATES
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Record a naming rule rejection.
pub fn record_validation_rejection(rule: &str) {
    NAME_VALIDATION_REJECTIONS.with_label_values(&[rule]).inc();
}
