#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use query_shaper::source::{
    AggregateArgs, CountArgs, DataSource, Database, FindManyArgs, GroupByArgs,
};
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use tokio::sync::Mutex;

static TRACING: Once = Once::new();

/// Route library logs to the test writer; filter with RUST_LOG
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Every call a [`RecordingSource`] received, in order
#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub find_many: Vec<FindManyArgs>,
    pub count: Vec<CountArgs>,
    pub aggregate: Vec<AggregateArgs>,
    pub group_by: Vec<GroupByArgs>,
}

/// In-memory data source returning canned rows and recording its arguments.
///
/// `find_many` honours `take` against the canned rows but ignores `where`,
/// `skip` and `cursor`; `count` returns the configured total.
pub struct RecordingSource {
    model: String,
    rows: Vec<Value>,
    total: u64,
    fail_with: Option<String>,
    calls: Mutex<Calls>,
}

impl RecordingSource {
    pub fn new(model: &str, rows: Vec<Value>) -> Self {
        let total = rows.len() as u64;
        Self {
            model: model.to_string(),
            rows,
            total,
            fail_with: None,
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = total;
        self
    }

    /// Every call fails with `message`
    pub fn failing(model: &str, message: &str) -> Self {
        let mut source = Self::new(model, Vec::new());
        source.fail_with = Some(message.to_string());
        source
    }

    pub async fn calls(&self) -> Calls {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl DataSource for RecordingSource {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Value>> {
        let take = args.take;
        self.calls.lock().await.find_many.push(args);
        if let Some(message) = &self.fail_with {
            bail!("{}", message);
        }

        let rows = match take {
            Some(take) => self.rows.iter().take(take.max(0) as usize).cloned().collect(),
            None => self.rows.clone(),
        };
        Ok(rows)
    }

    async fn count(&self, args: CountArgs) -> Result<u64> {
        self.calls.lock().await.count.push(args);
        if let Some(message) = &self.fail_with {
            bail!("{}", message);
        }
        Ok(self.total)
    }

    async fn aggregate(&self, args: AggregateArgs) -> Result<Value> {
        self.calls.lock().await.aggregate.push(args);
        if let Some(message) = &self.fail_with {
            bail!("{}", message);
        }
        Ok(json!({"_count": {"_all": self.total}}))
    }

    async fn group_by(&self, args: GroupByArgs) -> Result<Vec<Value>> {
        self.calls.lock().await.group_by.push(args);
        if let Some(message) = &self.fail_with {
            bail!("{}", message);
        }
        Ok(vec![json!({"status": "ACTIVE", "_count": {"_all": self.total}})])
    }
}

/// Source plus the type-erased handle the query builder needs
pub fn source(model: &str, rows: Vec<Value>) -> (Arc<RecordingSource>, Database) {
    let source = Arc::new(RecordingSource::new(model, rows));
    let database: Database = source.clone();
    (source, database)
}

/// `count` user rows with ids 1..=count
pub fn users(count: u64) -> Vec<Value> {
    (1..=count)
        .map(|id| {
            json!({
                "id": id,
                "name": format!("user{}", id),
                "email": format!("user{}@example.com", id),
                "status": "ACTIVE",
            })
        })
        .collect()
}
