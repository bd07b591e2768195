//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Popcorn server:
//! - HTTP request metrics (latency, counts, in-flight)
//! - Watched-list mutations through the API
//! - Watched-list size (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "popcorn_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("popcorn_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "popcorn_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Watched-List Metrics
// =============================================================================

/// Add/delete requests by outcome.
pub static WATCHED_MUTATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "popcorn_watched_mutations_total",
            "Watched-list mutations handled by the API",
        ),
        &["operation", "result"], // "add"/"delete"; "ok", "invalid", "duplicate", "error"
    )
    .unwrap()
});

/// Stored watched entries (collected dynamically).
pub static WATCHED_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "popcorn_watched_entries",
        "Number of entries on the watched list",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let server_metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // HTTP
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        // Watched list
        Box::new(WATCHED_MUTATIONS.clone()),
        Box::new(WATCHED_ENTRIES.clone()),
    ];

    // Core metrics (catalog, synchronizer)
    for metric in server_metrics
        .into_iter()
        .chain(popcorn_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the store at scrape time.
pub fn collect_dynamic_metrics(state: &AppState) {
    match state.store().count() {
        Ok(count) => WATCHED_ENTRIES.set(count),
        Err(e) => warn!("Failed to count watched entries: {}", e),
    }
}

static IMDB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d+").unwrap());
static HEX_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9a-fA-F]{32}").unwrap());
static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = IMDB_ID.replace_all(path, "{imdb_id}");
    let result = HEX_ID.replace_all(&result, "{id}");
    let result = NUMERIC.replace_all(&result, "/{id}$1");
    result.to_string()
}
