use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Timing record produced for every monitored query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetrics {
    pub model: String,
    pub operation: String,
    pub duration_ms: u64,
    pub result_count: usize,
    pub total: u64,
    pub page: i64,
    pub limit: i64,
    pub slow: bool,
    pub timestamp: DateTime<Utc>,
}

/// Callback invoked with each [`QueryMetrics`] record
pub type MetricsSubscriber = Arc<dyn Fn(&QueryMetrics) + Send + Sync>;

/// Subscriber list for query metrics.
///
/// Owned by a [`crate::advanced::QueryContext`]; nothing here is global, so two
/// contexts never see each other's subscribers.
#[derive(Clone, Default)]
pub struct MetricsHub {
    subscribers: Arc<RwLock<Vec<MetricsSubscriber>>>,
}

impl MetricsHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; it receives every record published afterwards
    pub async fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&QueryMetrics) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.write().await;
        subscribers.push(Arc::new(callback));
        debug!("Registered metrics subscriber ({} total)", subscribers.len());
    }

    /// Deliver a record to every subscriber, in registration order
    pub async fn publish(&self, metrics: &QueryMetrics) {
        let subscribers = self.subscribers.read().await.clone();
        for subscriber in subscribers {
            subscriber(metrics);
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Drop every registered subscriber
    pub async fn clear(&self) {
        self.subscribers.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> QueryMetrics {
        QueryMetrics {
            model: "user".into(),
            operation: "findMany".into(),
            duration_ms: 12,
            result_count: 3,
            total: 3,
            page: 1,
            limit: 10,
            slow: false,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let hub = MetricsHub::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            hub.subscribe(move |m| {
                assert_eq!(m.model, "user");
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }

        hub.publish(&sample()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(hub.subscriber_count().await, 2);
    }

    #[tokio::test]
    async fn test_hubs_are_isolated() {
        let first = MetricsHub::new();
        let second = MetricsHub::new();
        first.subscribe(|_| {}).await;

        assert_eq!(first.subscriber_count().await, 1);
        assert_eq!(second.subscriber_count().await, 0);

        first.clear().await;
        assert_eq!(first.subscriber_count().await, 0);
    }

    #[test]
    fn test_metrics_serialize_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["durationMs"], 12);
        assert_eq!(json["resultCount"], 3);
        assert_eq!(json["slow"], false);
    }
}
