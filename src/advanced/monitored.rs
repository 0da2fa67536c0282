use anyhow::Result;
use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::metrics::registry::{QUERY_DURATION_SECONDS, SLOW_QUERIES_TOTAL};
use crate::metrics::{MetricsHub, QueryMetrics};
use crate::query::builder::{PaginatedResponse, QueryBuilder, QueryOptions};

/// Times queries, attaches the timing to the envelope and publishes it
#[derive(Clone)]
pub struct QueryMonitor {
    hub: MetricsHub,
    slow_threshold: Duration,
}

impl QueryMonitor {
    pub fn new(hub: MetricsHub, slow_threshold: Duration) -> Self {
        Self {
            hub,
            slow_threshold,
        }
    }

    pub fn hub(&self) -> &MetricsHub {
        &self.hub
    }

    pub fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }

    /// Run the query and attach a `_metrics` record. Failed queries publish
    /// nothing and return the error unchanged.
    pub async fn monitored_query(
        &self,
        builder: &QueryBuilder,
        options: &QueryOptions,
    ) -> Result<PaginatedResponse> {
        let model = builder.model_name().to_string();
        let start = Instant::now();

        let mut response = builder.execute(options).await?;

        let elapsed = start.elapsed();
        let slow = elapsed > self.slow_threshold;

        QUERY_DURATION_SECONDS
            .with_label_values(&[&model])
            .observe(elapsed.as_secs_f64());

        if slow {
            SLOW_QUERIES_TOTAL.with_label_values(&[&model]).inc();
            warn!(
                model = %model,
                duration_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_threshold.as_millis() as u64,
                "Slow query detected"
            );
        } else {
            debug!(model = %model, "Query completed in {:?}", elapsed);
        }

        let metrics = QueryMetrics {
            model,
            operation: "findMany".to_string(),
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            result_count: response.data.len(),
            total: response.meta.total,
            page: response.meta.page,
            limit: response.meta.limit,
            slow,
            timestamp: Utc::now(),
        };

        self.hub.publish(&metrics).await;
        response.metrics = Some(metrics);

        Ok(response)
    }
}
