//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `schema_registry_reconciliations_total` - Reconciliations by resource kind
//! - `schema_registry_reconciliation_errors_total` - Reconcile errors by resource kind
//! - `schema_registry_reconciliation_duration_seconds` - Reconcile duration by resource kind
//! - `schema_registry_registry_operations_total` - Registry API calls by operation and outcome
//! - `schema_registry_registry_operation_duration_seconds` - Registry API call duration
//! - `schema_registry_connected` - 1 when a SchemaRegistry passed its last health check, else 0
//! - `schema_registry_schemas_registered_total` - Successful schema registrations
//! - `schema_registry_compatibility_failures_total` - Failed compatibility updates
//! - `schema_registry_cleanup_skipped_total` - Deletions that removed the finalizer without remote cleanup
//! - `schema_registry_requeues_total` - Requeues by reason

use anyhow::Result;
use prometheus::{HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "schema_registry_reconciliations_total",
            "Total number of reconciliations",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "schema_registry_reconciliation_errors_total",
            "Total number of reconciliation errors",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "schema_registry_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REGISTRY_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "schema_registry_registry_operations_total",
            "Total number of Schema Registry API operations",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create REGISTRY_OPERATIONS_TOTAL metric - this should never happen")
});

static REGISTRY_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "schema_registry_registry_operation_duration_seconds",
            "Duration of Schema Registry API operations in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        &["operation"],
    )
    .expect("Failed to create REGISTRY_OPERATION_DURATION metric - this should never happen")
});

static REGISTRY_CONNECTED: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "schema_registry_connected",
            "Whether a SchemaRegistry passed its last health check (1) or not (0)",
        ),
        &["namespace", "name"],
    )
    .expect("Failed to create REGISTRY_CONNECTED metric - this should never happen")
});

static SCHEMAS_REGISTERED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "schema_registry_schemas_registered_total",
        "Total number of successful schema registrations",
    )
    .expect("Failed to create SCHEMAS_REGISTERED_TOTAL metric - this should never happen")
});

static COMPATIBILITY_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "schema_registry_compatibility_failures_total",
        "Total number of failed compatibility level updates",
    )
    .expect("Failed to create COMPATIBILITY_FAILURES_TOTAL metric - this should never happen")
});

static CLEANUP_SKIPPED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "schema_registry_cleanup_skipped_total",
            "Total number of Schema deletions that released the finalizer without deleting the subject",
        ),
        &["reason"],
    )
    .expect("Failed to create CLEANUP_SKIPPED_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "schema_registry_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

/// Register every metric with the process registry
///
/// # Errors
///
/// Fails if called twice, since the registry rejects duplicate collectors.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REGISTRY_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REGISTRY_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REGISTRY_CONNECTED.clone()))?;
    REGISTRY.register(Box::new(SCHEMAS_REGISTERED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(COMPATIBILITY_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CLEANUP_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration);
}

/// Record one registry API call; `outcome` is `success` or an error kind
pub fn record_registry_operation(operation: &str, outcome: &str, duration: f64) {
    REGISTRY_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    REGISTRY_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn set_registry_connected(namespace: &str, name: &str, connected: bool) {
    REGISTRY_CONNECTED
        .with_label_values(&[namespace, name])
        .set(i64::from(connected));
}

/// Drop the gauge series of a deleted `SchemaRegistry`
pub fn remove_registry_connected(namespace: &str, name: &str) {
    // Absent when the registry was never probed
    let _ = REGISTRY_CONNECTED.remove_label_values(&[namespace, name]);
}

pub fn increment_schemas_registered() {
    SCHEMAS_REGISTERED_TOTAL.inc();
}

pub fn increment_compatibility_failures() {
    COMPATIBILITY_FAILURES_TOTAL.inc();
}

pub fn increment_cleanup_skipped(reason: &str) {
    CLEANUP_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}
