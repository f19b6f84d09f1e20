//! Prometheus metrics registry and instruments.
//!
//! Instruments are usable before `init_metrics` runs; registration only makes
//! them visible through `REGISTRY`.

use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Database Metrics
    pub static ref DB_QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("feedline_db_queries_total", "Total number of database queries"),
        &["operation", "table"]
    ).expect("metric can be created");
    pub static ref DB_QUERY_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "feedline_db_query_duration_seconds",
            "Database query duration in seconds"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation", "table"]
    ).expect("metric can be created");
    pub static ref TRANSACTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("feedline_transactions_total", "Total number of units of work by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    // Feed Metrics
    pub static ref POSTS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "feedline_posts_created_total",
        "Total number of posts created"
    ).expect("metric can be created");
    pub static ref TAGS_ATTACHED_TOTAL: IntCounter = IntCounter::new(
        "feedline_tags_attached_total",
        "Total number of tag rows attached to posts"
    ).expect("metric can be created");
    pub static ref LIKES_RECORDED_TOTAL: IntCounter = IntCounter::new(
        "feedline_likes_recorded_total",
        "Total number of likes recorded"
    ).expect("metric can be created");
    pub static ref FEED_PAGES_SERVED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("feedline_feed_pages_served_total", "Total number of feed pages served"),
        &["feed"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("feedline_errors_total", "Total number of errors"),
        &["error_type", "operation"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(DB_QUERIES_TOTAL.clone()))
        .expect("DB_QUERIES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
        .expect("DB_QUERY_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(TRANSACTIONS_TOTAL.clone()))
        .expect("TRANSACTIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(POSTS_CREATED_TOTAL.clone()))
        .expect("POSTS_CREATED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(TAGS_ATTACHED_TOTAL.clone()))
        .expect("TAGS_ATTACHED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(LIKES_RECORDED_TOTAL.clone()))
        .expect("LIKES_RECORDED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(FEED_PAGES_SERVED_TOTAL.clone()))
        .expect("FEED_PAGES_SERVED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Record one database query.
pub fn observe_db_query(operation: &str, table: &str, elapsed: Duration) {
    DB_QUERIES_TOTAL
        .with_label_values(&[operation, table])
        .inc();
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation, table])
        .observe(elapsed.as_secs_f64());
}

/// Record an error surfaced by a service operation.
pub fn record_error(error: &crate::error::AppError, operation: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error.kind(), operation])
        .inc();
}
