//! Metrics and observability utilities
//!
//! Provides metrics-rs counters and histograms with
//! standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all AskArxiv metrics
pub const METRICS_PREFIX: &str = "askarxiv";

/// Histogram buckets for database query latency (in seconds)
pub const QUERY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    5.000, // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_db_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total repository operations by kind and outcome"
    );

    describe_histogram!(
        format!("{}_db_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Repository operation latency in seconds"
    );

    describe_counter!(
        format!("{}_schema_rejections_total", METRICS_PREFIX),
        Unit::Count,
        "Total payloads rejected by schema validation"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record repository operation metrics
pub struct QueryMetrics {
    start: Instant,
    operation: &'static str,
}

impl QueryMetrics {
    /// Start tracking a repository operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Record operation completion
    pub fn finish(self, ok: bool) {
        let duration = self.start.elapsed().as_secs_f64();
        let status = if ok { "success" } else { "error" };

        counter!(
            format!("{}_db_queries_total", METRICS_PREFIX),
            "operation" => self.operation,
            "status" => status
        )
        .increment(1);

        histogram!(
            format!("{}_db_query_duration_seconds", METRICS_PREFIX),
            "operation" => self.operation
        )
        .record(duration);
    }
}

/// Helper to record a schema validation rejection
pub fn record_schema_rejection(schema: &'static str) {
    counter!(
        format!("{}_schema_rejections_total", METRICS_PREFIX),
        "schema" => schema
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in QUERY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_query_metrics() {
        let metrics = QueryMetrics::start("get_by_id");
        std::thread::sleep(std::time::Duration::from_millis(1));
        metrics.finish(true);
        // Just verify it runs without panic
    }
}
