//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Local PDF cache (lookups, downloads, commits)
//! - Platform opener
//! - Cover thumbnail generation
//! - Backend catalog requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Cache
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("libris_cache_lookups_total", "Total local cache lookups"),
        &["result"], // "hit", "miss", "bypass"
    )
    .unwrap()
});

/// Downloads by result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("libris_downloads_total", "Total document downloads"),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Bytes written into the cache by downloads.
pub static DOWNLOADED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "libris_downloaded_bytes_total",
        "Total bytes downloaded into the local cache",
    )
    .unwrap()
});

/// Download duration in seconds.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "libris_download_duration_seconds",
            "Duration of document downloads",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["result"],
    )
    .unwrap()
});

/// Cache commits that failed after a successful download.
pub static COMMIT_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "libris_cache_commit_failures_total",
        "Total failures moving a staged download into the cache",
    )
    .unwrap()
});

// =============================================================================
// Opener
// =============================================================================

/// Viewer launches by result.
pub static OPENS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("libris_opens_total", "Total document viewer launches"),
        &["result"], // "opened", "failed"
    )
    .unwrap()
});

// =============================================================================
// Thumbnails
// =============================================================================

/// Thumbnail events by outcome.
pub static THUMBNAILS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("libris_thumbnails_total", "Total storage events handled"),
        &["outcome"], // "generated", "skipped", "rejected", "failed"
    )
    .unwrap()
});

// =============================================================================
// Backend
// =============================================================================

/// Backend request duration in seconds.
pub static BACKEND_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "libris_backend_request_duration_seconds",
            "Duration of backend REST requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation", "result"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Cache
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(DOWNLOADED_BYTES.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(COMMIT_FAILURES.clone()),
        // Opener
        Box::new(OPENS_TOTAL.clone()),
        // Thumbnails
        Box::new(THUMBNAILS_TOTAL.clone()),
        // Backend
        Box::new(BACKEND_REQUEST_DURATION.clone()),
    ]
}
