use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

lazy_static! {
    // Data source metrics
    pub static ref DATA_SOURCE_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "query_shaper_data_source_calls_total",
        "Total calls into the data source",
        &["model", "operation", "outcome"]  // operation: findMany, count, aggregate, groupBy
    )
    .unwrap();

    pub static ref DATA_SOURCE_CALL_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "query_shaper_data_source_call_duration_seconds",
        "Data source call duration in seconds",
        &["model", "operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // Query metrics
    pub static ref QUERY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "query_shaper_query_duration_seconds",
        "Monitored query duration in seconds",
        &["model"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    pub static ref SLOW_QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "query_shaper_slow_queries_total",
        "Total monitored queries above the slow threshold",
        &["model"]
    )
    .unwrap();

    // Cache metrics
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "query_shaper_cache_hits_total",
        "Total cache hits",
        &["store"]  // store: memory, redis
    )
    .unwrap();

    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "query_shaper_cache_misses_total",
        "Total cache misses",
        &["store"]
    )
    .unwrap();

    // Webhook metrics
    pub static ref WEBHOOK_DELIVERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "query_shaper_webhook_deliveries_total",
        "Total webhook delivery attempts",
        &["outcome"]  // outcome: success, failure
    )
    .unwrap();
}

/// Initialize all metrics (call once at startup)
pub fn init_metrics() {
    // Force lazy_static initialization
    lazy_static::initialize(&DATA_SOURCE_CALLS_TOTAL);
    lazy_static::initialize(&DATA_SOURCE_CALL_DURATION_SECONDS);
    lazy_static::initialize(&QUERY_DURATION_SECONDS);
    lazy_static::initialize(&SLOW_QUERIES_TOTAL);
    lazy_static::initialize(&CACHE_HITS_TOTAL);
    lazy_static::initialize(&CACHE_MISSES_TOTAL);
    lazy_static::initialize(&WEBHOOK_DELIVERIES_TOTAL);
}
