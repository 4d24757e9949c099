//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Upstream requests (outcome, latency, retries)
//! - Response cache hit ratio
//! - Tool invocations

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Upstream Metrics
// =============================================================================

/// Upstream requests by HTTP method and outcome.
pub static UPSTREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelgate_upstream_requests_total",
            "Total upstream requests (one per attempt)",
        ),
        &["method", "outcome"], // "success" or an UpstreamError label
    )
    .unwrap()
});

/// Upstream request duration in seconds, per attempt.
pub static UPSTREAM_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelgate_upstream_request_duration_seconds",
            "Duration of upstream HTTP requests",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method"],
    )
    .unwrap()
});

/// Retries scheduled after a transient read failure.
pub static UPSTREAM_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelgate_upstream_retries_total",
        "Upstream read retries after transient failures",
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelgate_cache_lookups_total", "Response cache lookups"),
        &["result"], // "hit", "miss", "expired"
    )
    .unwrap()
});

// =============================================================================
// Tool Metrics
// =============================================================================

/// Tool invocations by tool name and outcome.
pub static TOOL_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelgate_tool_calls_total", "Total tool invocations"),
        &["tool", "outcome"], // outcome: "success" or an error kind
    )
    .unwrap()
});

/// All core metrics, for registration in the server's registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(UPSTREAM_REQUESTS.clone()),
        Box::new(UPSTREAM_REQUEST_DURATION.clone()),
        Box::new(UPSTREAM_RETRIES.clone()),
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(TOOL_CALLS.clone()),
    ]
}
