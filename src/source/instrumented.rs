use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;
use tracing::error;

use super::args::{AggregateArgs, CountArgs, FindManyArgs, GroupByArgs};
use super::{DataSource, Database};
use crate::metrics::registry::{DATA_SOURCE_CALLS_TOTAL, DATA_SOURCE_CALL_DURATION_SECONDS};

/// A thin wrapper around a [`DataSource`] that records Prometheus call counts
/// and durations per model and operation.
///
/// Results pass through untouched, errors included.
pub struct InstrumentedSource {
    inner: Database,
}

impl InstrumentedSource {
    pub fn new(inner: Database) -> Self {
        Self { inner }
    }

    fn observe<T>(&self, operation: &'static str, start: Instant, res: &Result<T>) {
        let seconds = start.elapsed().as_secs_f64();
        let model = self.inner.model_name();
        let outcome = match res {
            Ok(_) => "ok",
            Err(e) => {
                error!(model, operation, "Data source call failed: {:?}", e);
                "error"
            }
        };

        DATA_SOURCE_CALLS_TOTAL
            .with_label_values(&[model, operation, outcome])
            .inc();
        DATA_SOURCE_CALL_DURATION_SECONDS
            .with_label_values(&[model, operation])
            .observe(seconds);
    }
}

#[async_trait]
impl DataSource for InstrumentedSource {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Value>> {
        let start = Instant::now();
        let res = self.inner.find_many(args).await;
        self.observe("findMany", start, &res);
        res
    }

    async fn count(&self, args: CountArgs) -> Result<u64> {
        let start = Instant::now();
        let res = self.inner.count(args).await;
        self.observe("count", start, &res);
        res
    }

    async fn aggregate(&self, args: AggregateArgs) -> Result<Value> {
        let start = Instant::now();
        let res = self.inner.aggregate(args).await;
        self.observe("aggregate", start, &res);
        res
    }

    async fn group_by(&self, args: GroupByArgs) -> Result<Vec<Value>> {
        let start = Instant::now();
        let res = self.inner.group_by(args).await;
        self.observe("groupBy", start, &res);
        res
    }
}
