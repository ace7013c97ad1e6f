//! Prometheus metrics for the article pipeline.
//!
//! Every metric lives in the crate registry and is exported by `GET /metrics`:
//! - Watermark poller: published articles, publish failures, current watermark
//! - Bulk indexer: consumed events by outcome, flushes by result, documents sent
//! - Search API: requests by endpoint, baseline scan latency
//!
//! # Example
//! ```no_run
//! use article_pipeline::metrics::{gather_metrics, ARTICLES_PUBLISHED_TOTAL};
//!
//! ARTICLES_PUBLISHED_TOTAL.inc();
//! println!("{}", gather_metrics());
//! ```

use lazy_static::lazy_static;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

const NAMESPACE: &str = "article_pipeline";

lazy_static! {
    // ============================================================================
    // Watermark Poller Metrics
    // ============================================================================

    /// Articles successfully handed to the event bus
    pub static ref ARTICLES_PUBLISHED_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("articles_published_total", "Articles published to the event bus")
            .namespace(NAMESPACE)
    ).expect("Failed to create ARTICLES_PUBLISHED_TOTAL metric");

    /// Articles whose publish attempt failed
    pub static ref PUBLISH_FAILURES_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("publish_failures_total", "Articles that failed to publish")
            .namespace(NAMESPACE)
    ).expect("Failed to create PUBLISH_FAILURES_TOTAL metric");

    /// Highest article id handed to the event bus
    pub static ref WATERMARK: IntGauge = IntGauge::with_opts(
        Opts::new("watermark", "Highest article id handed to the event bus")
            .namespace(NAMESPACE)
    ).expect("Failed to create WATERMARK metric");

    // ============================================================================
    // Bulk Indexer Metrics
    // ============================================================================

    /// Events read from the bus
    ///
    /// Labels: outcome (buffered, dropped)
    pub static ref EVENTS_CONSUMED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("events_consumed_total", "Events read from the event bus")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create EVENTS_CONSUMED_TOTAL metric");

    /// Bulk requests sent to the index store
    ///
    /// Labels: result (success, failure)
    pub static ref BULK_FLUSHES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bulk_flushes_total", "Bulk requests sent to the index store")
            .namespace(NAMESPACE),
        &["result"]
    ).expect("Failed to create BULK_FLUSHES_TOTAL metric");

    /// Documents included in bulk requests
    pub static ref BULK_DOCUMENTS_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("bulk_documents_total", "Documents included in bulk requests")
            .namespace(NAMESPACE)
    ).expect("Failed to create BULK_DOCUMENTS_TOTAL metric");

    // ============================================================================
    // Search API Metrics
    // ============================================================================

    /// Search API requests
    ///
    /// Labels: endpoint (search, tags, baseline)
    pub static ref SEARCH_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("search_requests_total", "Search API requests")
            .namespace(NAMESPACE),
        &["endpoint"]
    ).expect("Failed to create SEARCH_REQUESTS_TOTAL metric");

    /// Latency of the unindexed relational scan
    pub static ref BASELINE_SCAN_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "baseline_scan_seconds",
            "Latency of the unindexed LIKE scan against the relational store"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    ).expect("Failed to create BASELINE_SCAN_SECONDS metric");

    /// Registry holding every metric above
    pub static ref PROMETHEUS_REGISTRY: Registry = build_registry()
        .expect("Failed to register pipeline metrics");
}

fn build_registry() -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();
    registry.register(Box::new(ARTICLES_PUBLISHED_TOTAL.clone()))?;
    registry.register(Box::new(PUBLISH_FAILURES_TOTAL.clone()))?;
    registry.register(Box::new(WATERMARK.clone()))?;
    registry.register(Box::new(EVENTS_CONSUMED_TOTAL.clone()))?;
    registry.register(Box::new(BULK_FLUSHES_TOTAL.clone()))?;
    registry.register(Box::new(BULK_DOCUMENTS_TOTAL.clone()))?;
    registry.register(Box::new(SEARCH_REQUESTS_TOTAL.clone()))?;
    registry.register(Box::new(BASELINE_SCAN_SECONDS.clone()))?;
    Ok(registry)
}

/// Initialize the metrics registry. Safe to call more than once.
pub fn init_metrics() {
    lazy_static::initialize(&PROMETHEUS_REGISTRY);
}

/// Export all metrics in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
