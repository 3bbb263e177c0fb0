//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Trigger outcomes per uploaded file
//! - Bytes staged into object storage
//! - External services (object storage, pipeline API)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Trigger Metrics
// =============================================================================

/// Uploaded files processed, by outcome.
pub static TRIGGERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("napex_triggers_total", "Uploaded files processed by outcome"),
        &["result"], // "triggered", "skipped_duplicate", "failed"
    )
    .unwrap()
});

/// Files processed per trigger request.
pub static FILES_PER_REQUEST: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "napex_files_per_request",
            "Number of uploaded files per trigger request",
        )
        .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0]),
    )
    .unwrap()
});

/// Bytes written to object storage.
pub static BYTES_STAGED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("napex_bytes_staged_total", "Total bytes staged in object storage")
        .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "napex_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "napex_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TRIGGERS_TOTAL.clone()),
        Box::new(FILES_PER_REQUEST.clone()),
        Box::new(BYTES_STAGED.clone()),
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
