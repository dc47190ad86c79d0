//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all PYQ Hub metrics
pub const METRICS_PREFIX: &str = "pyqhub";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 10ms, P99 < 100ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms - P50 target
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s (large uploads)
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Query metrics
    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of paper searches"
    );

    describe_counter!(
        format!("{}_filter_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of paper filter requests"
    );

    describe_gauge!(
        format!("{}_query_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of papers returned by the last search or filter"
    );

    // Upload metrics
    describe_counter!(
        format!("{}_papers_uploaded_total", METRICS_PREFIX),
        Unit::Count,
        "Total papers uploaded"
    );

    describe_counter!(
        format!("{}_upload_bytes_total", METRICS_PREFIX),
        Unit::Bytes,
        "Total bytes written for uploaded papers"
    );

    describe_counter!(
        format!("{}_upload_rejections_total", METRICS_PREFIX),
        Unit::Count,
        "Upload requests rejected before any paper was recorded"
    );

    describe_counter!(
        format!("{}_downloads_total", METRICS_PREFIX),
        Unit::Count,
        "Total paper downloads started"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record search metrics
pub fn record_search(result_count: usize) {
    counter!(format!("{}_search_queries_total", METRICS_PREFIX)).increment(1);

    gauge!(
        format!("{}_query_results_count", METRICS_PREFIX),
        "kind" => "search"
    )
    .set(result_count as f64);
}

/// Helper to record filter metrics
pub fn record_filter(result_count: usize) {
    counter!(format!("{}_filter_queries_total", METRICS_PREFIX)).increment(1);

    gauge!(
        format!("{}_query_results_count", METRICS_PREFIX),
        "kind" => "filter"
    )
    .set(result_count as f64);
}

/// Helper to record a completed upload
pub fn record_upload(university_id: i32, files: usize, bytes: u64) {
    counter!(
        format!("{}_papers_uploaded_total", METRICS_PREFIX),
        "university" => university_id.to_string()
    )
    .increment(files as u64);

    counter!(format!("{}_upload_bytes_total", METRICS_PREFIX)).increment(bytes);
}

/// Helper to record a rejected upload
pub fn record_upload_rejection(reason: &'static str) {
    counter!(
        format!("{}_upload_rejections_total", METRICS_PREFIX),
        "reason" => reason
    )
    .increment(1);
}

/// Helper to record a download
pub fn record_download() {
    counter!(format!("{}_downloads_total", METRICS_PREFIX)).increment(1);
}
