use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::args::{AggregateArgs, CountArgs, FindManyArgs, GroupByArgs};

/// Data-access trait for the ORM client a query is handed off to.
///
/// Implementations own connection handling and query execution; the builders
/// only shape the arguments. Errors returned here reach the caller untouched.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Model identity, used in cache keys, metrics and logs
    fn model_name(&self) -> &str;

    /// Fetch rows matching the arguments
    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Value>>;

    /// Count rows matching the condition
    async fn count(&self, args: CountArgs) -> Result<u64>;

    /// Run an aggregation over the matching rows
    async fn aggregate(&self, _args: AggregateArgs) -> Result<Value> {
        anyhow::bail!("aggregate is not supported by {}", self.model_name())
    }

    /// Run a grouped aggregation over the matching rows
    async fn group_by(&self, _args: GroupByArgs) -> Result<Vec<Value>> {
        anyhow::bail!("groupBy is not supported by {}", self.model_name())
    }
}
