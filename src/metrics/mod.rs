pub mod hub;
pub mod registry;

use anyhow::{Context, Result};
use prometheus::{Encoder, TextEncoder};

pub use hub::{MetricsHub, MetricsSubscriber, QueryMetrics};

/// Render every registered metric in the Prometheus exposition format
pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;

    String::from_utf8(buffer).context("Metrics output was not valid UTF-8")
}

// Re-export commonly used metrics for convenience
pub use registry::{
    init_metrics, CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL, DATA_SOURCE_CALLS_TOTAL,
    DATA_SOURCE_CALL_DURATION_SECONDS, QUERY_DURATION_SECONDS, SLOW_QUERIES_TOTAL,
    WEBHOOK_DELIVERIES_TOTAL,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_metrics_includes_registered_families() {
        init_metrics();
        CACHE_HITS_TOTAL.with_label_values(&["memory"]).inc();

        let output = gather_metrics().unwrap();
        assert!(output.contains("query_shaper_cache_hits_total"));
    }
}
