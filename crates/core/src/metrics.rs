//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Catalog lookups (search, detail)
//! - Watched-list synchronization (load, add, remove)

use std::time::Instant;

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Catalog Metrics
// =============================================================================

/// Catalog requests by operation and result.
pub static CATALOG_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "popcorn_catalog_requests_total",
            "Total movie catalog requests",
        ),
        &["operation", "result"], // "search"/"detail"; "ok", "no_matches", "error", "cancelled", "timeout"
    )
    .unwrap()
});

/// Catalog request duration in seconds.
pub static CATALOG_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "popcorn_catalog_request_duration_seconds",
            "Duration of movie catalog requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Synchronizer Metrics
// =============================================================================

/// Watched-list operations by operation and result.
pub static SYNC_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "popcorn_sync_operations_total",
            "Total watched-list synchronizer operations",
        ),
        &["operation", "result"], // "load"/"add"/"remove"; "ok", "rejected", "error", "cancelled", "timeout"
    )
    .unwrap()
});

/// Record one finished catalog request.
pub fn record_catalog_request(operation: &str, result: &str, started: Instant) {
    CATALOG_REQUESTS
        .with_label_values(&[operation, result])
        .inc();
    CATALOG_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());
}

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Catalog
        Box::new(CATALOG_REQUESTS.clone()),
        Box::new(CATALOG_REQUEST_DURATION.clone()),
        // Synchronizer
        Box::new(SYNC_OPERATIONS.clone()),
    ]
}
