//! Prometheus metrics for the search gateway

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

/// Search gateway metrics collection
pub struct SearchMetrics {
    /// Searches served, by route
    pub searches_total: CounterVec,

    /// Searches that failed on every backend
    pub search_failures_total: CounterVec,

    /// Best-effort index writes that failed, by operation
    pub index_failures_total: CounterVec,

    /// Search duration in seconds, by route
    pub search_duration: HistogramVec,
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self {
            searches_total: register_counter_vec!(
                "errata_searches_total",
                "Total number of searches served",
                &["route"]
            )
            .unwrap(),

            search_failures_total: register_counter_vec!(
                "errata_search_failures_total",
                "Total number of searches no backend could serve",
                &["error"]
            )
            .unwrap(),

            index_failures_total: register_counter_vec!(
                "errata_index_failures_total",
                "Total number of failed best-effort index writes",
                &["operation"]
            )
            .unwrap(),

            search_duration: register_histogram_vec!(
                "errata_search_duration_seconds",
                "Search duration in seconds",
                &["route"],
                vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
            )
            .unwrap(),
        }
    }

    /// Record a search answered via `route`
    pub fn record_search(&self, route: &str, duration_secs: f64) {
        self.searches_total.with_label_values(&[route]).inc();
        self.search_duration
            .with_label_values(&[route])
            .observe(duration_secs);
    }

    pub fn record_search_failure(&self, error_code: &str) {
        self.search_failures_total
            .with_label_values(&[error_code])
            .inc();
    }

    /// Record `count` failed index writes for `operation`
    pub fn record_index_failures(&self, operation: &str, count: usize) {
        if count > 0 {
            self.index_failures_total
                .with_label_values(&[operation])
                .inc_by(count as f64);
        }
    }
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Global search metrics instance
    pub static ref SEARCH_METRICS: SearchMetrics = SearchMetrics::new();
}

/// Initialize search metrics (idempotent)
pub fn init_search_metrics() {
    lazy_static::initialize(&SEARCH_METRICS);
}

/// Render the default registry in the Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
