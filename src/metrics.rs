//! Prometheus metrics for request latency and record mutations.
//!
//! This module provides:
//! - HTTP request latency per route and status
//! - Store operation latency per operation
//! - Counters for created, updated, and deleted records
//! - A counter for rejected writes

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Store operation latency metric name.
pub const METRIC_STORE_OPERATION_LATENCY: &str = "store_operation_latency_ms";
/// Records created counter metric name.
pub const METRIC_RECORDS_CREATED: &str = "records_created_total";
/// Records updated counter metric name.
pub const METRIC_RECORDS_UPDATED: &str = "records_updated_total";
/// Records deleted counter metric name.
pub const METRIC_RECORDS_DELETED: &str = "records_deleted_total";
/// Validation failures counter metric name.
pub const METRIC_VALIDATION_FAILURES: &str = "validation_failures_total";

/// Initialize all metric descriptions.
/// Call this once at startup, after the recorder is installed.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_STORE_OPERATION_LATENCY,
        "Data store operation latency in milliseconds"
    );

    describe_counter!(METRIC_RECORDS_CREATED, "Total number of records created");
    describe_counter!(METRIC_RECORDS_UPDATED, "Total number of record updates");
    describe_counter!(METRIC_RECORDS_DELETED, "Total number of records deleted");
    describe_counter!(
        METRIC_VALIDATION_FAILURES,
        "Total number of writes rejected by validation"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, method: &str, route: &str, status: u16) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .record(latency_ms);
}

/// Increment records created counter.
pub fn inc_records_created() {
    counter!(METRIC_RECORDS_CREATED).increment(1);
}

/// Increment records updated counter.
pub fn inc_records_updated() {
    counter!(METRIC_RECORDS_UPDATED).increment(1);
}

/// Increment records deleted counter.
pub fn inc_records_deleted() {
    counter!(METRIC_RECORDS_DELETED).increment(1);
}

/// Increment validation failures counter.
pub fn inc_validation_failures() {
    counter!(METRIC_VALIDATION_FAILURES).increment(1);
}

/// RAII guard for timing store operations.
/// Records latency when dropped.
pub struct StoreTimer {
    start: Instant,
    operation: &'static str,
}

impl StoreTimer {
    /// Start timing the named operation.
    pub fn new(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for StoreTimer {
    fn drop(&mut self) {
        histogram!(METRIC_STORE_OPERATION_LATENCY, "operation" => self.operation)
            .record(self.elapsed_ms());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn store_timer_measures_time() {
        let timer = StoreTimer::new("get");
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 9.0);
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        inc_records_created();
        inc_validation_failures();
        record_http_latency(Instant::now(), "GET", "/health-data/", 200);
    }
}
