// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the MySQL operator.
//!
//! This module provides metrics collection with the namespace prefix
//! `mysql_oracle_com_` (prometheus-safe version of "mysql.oracle.com").
//!
//! # Metrics Categories
//!
//! - **Admission Metrics** - Requests handled by the webhook and their outcome
//! - **Validation Metrics** - Objects rejected by validation
//! - **Lifecycle Metrics** - Phase transitions refused by the state machines
//! - **Client Metrics** - Façade calls against the API server
//!
//! # Example
//!
//! ```rust,no_run
//! use mysql_operator::metrics::{record_admission, gather_metrics};
//!
//! record_admission("Cluster", "CREATE", "allowed", std::time::Duration::from_millis(3));
//! let text = gather_metrics().unwrap();
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all operator metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "mysql_oracle_com";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn register_counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let opts = Opts::new(format!("{METRICS_NAMESPACE}_{name}"), help);
    let counter = CounterVec::new(opts, labels).expect("metric options are static and valid");
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .expect("metric names are registered once");
    counter
}

// ============================================================================
// Admission Metrics
// ============================================================================

/// Total number of admission requests
///
/// Labels:
/// - `kind`: Kind of the reviewed object (e.g., `Cluster`)
/// - `operation`: Admission operation (`CREATE`, `UPDATE`, ...)
/// - `result`: `allowed`, `patched`, `denied` or `error`
pub static ADMISSION_REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "admission_requests_total",
        "Total number of admission requests by kind, operation and result",
        &["kind", "operation", "result"],
    )
});

/// Duration of admission request handling in seconds
///
/// Labels:
/// - `kind`: Kind of the reviewed object
/// - `operation`: Admission operation
pub static ADMISSION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_admission_duration_seconds"),
        "Duration of admission request handling in seconds",
    )
    .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]);
    let histogram =
        HistogramVec::new(opts, &["kind", "operation"]).expect("metric options are static and valid");
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("metric names are registered once");
    histogram
});

// ============================================================================
// Validation and Lifecycle Metrics
// ============================================================================

/// Total number of objects rejected by validation
///
/// Labels:
/// - `kind`: Kind of the rejected object
pub static VALIDATION_FAILURES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "validation_failures_total",
        "Total number of objects rejected by validation by kind",
        &["kind"],
    )
});

/// Total number of illegal phase transitions refused
///
/// Labels:
/// - `kind`: Kind whose phase machine refused the write
pub static ILLEGAL_TRANSITIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "illegal_transitions_total",
        "Total number of illegal phase transitions refused by kind",
        &["kind"],
    )
});

// ============================================================================
// Client Metrics
// ============================================================================

/// Total number of client façade calls
///
/// Labels:
/// - `kind`: Resource kind
/// - `verb`: `get`, `list`, `create`, `update`, `update_status`, `delete`, ...
/// - `result`: `success` or an error category (`not_found`, `conflict`, ...)
pub static CLIENT_REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "client_requests_total",
        "Total number of client facade calls by kind, verb and result",
        &["kind", "verb", "result"],
    )
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a handled admission request
///
/// # Arguments
/// * `kind` - Kind of the reviewed object
/// * `operation` - Admission operation (`CREATE`, `UPDATE`, ...)
/// * `result` - Outcome (`allowed`, `patched`, `denied`, `error`)
/// * `duration` - Time spent handling the request
pub fn record_admission(kind: &str, operation: &str, result: &str, duration: Duration) {
    ADMISSION_REQUESTS_TOTAL
        .with_label_values(&[kind, operation, result])
        .inc();
    ADMISSION_DURATION_SECONDS
        .with_label_values(&[kind, operation])
        .observe(duration.as_secs_f64());
}

/// Record an object rejected by validation
pub fn record_validation_failure(kind: &str) {
    VALIDATION_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

/// Record a refused phase transition
pub fn record_illegal_transition(kind: &str) {
    ILLEGAL_TRANSITIONS_TOTAL.with_label_values(&[kind]).inc();
}

/// Record a client façade call
pub fn record_client_request(kind: &str, verb: &str, result: &str) {
    CLIENT_REQUESTS_TOTAL
        .with_label_values(&[kind, verb, result])
        .inc();
}

/// Gather all metrics in Prometheus text format
///
/// # Errors
///
/// Returns an error if metrics cannot be encoded.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
