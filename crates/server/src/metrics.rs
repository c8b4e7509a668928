//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the libris server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Authentication failures on protected routes
//! - Local cache size (collected dynamically)
//! - Core metrics (cache lookups, downloads, opens, thumbnails, backend)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use tracing::{error, warn};

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
            "libris_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("libris_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "libris_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures by reason.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "libris_auth_failures_total",
            "Requests rejected by the authenticator",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics (collected dynamically)
// =============================================================================

/// Documents in the local cache.
pub static CACHED_DOCUMENTS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("libris_cached_documents", "Number of documents in the local cache").unwrap()
});

/// Bytes used by the local cache.
pub static CACHED_BYTES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("libris_cached_bytes", "Total size of cached documents in bytes").unwrap()
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
        Box::new(AUTH_FAILURES_TOTAL.clone()),
        // Cache
        Box::new(CACHED_DOCUMENTS.clone()),
        Box::new(CACHED_BYTES.clone()),
    ];

    for metric in server_metrics
        .into_iter()
        .chain(libris_core::metrics::all_metrics())
    {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
pub async fn collect_dynamic_metrics(state: &AppState) {
    match state.library().cached_documents().await {
        Ok(files) => {
            CACHED_DOCUMENTS.set(files.len() as i64);
            CACHED_BYTES.set(files.iter().map(|f| f.size_bytes as i64).sum());
        }
        Err(e) => warn!("Failed to list cache for metrics: {}", e),
    }
}
