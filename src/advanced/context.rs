use anyhow::Result;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::export::{to_csv, to_json};
use super::monitored::QueryMonitor;
use super::presets::PresetStore;
use super::soft_delete::{build_soft_delete_filter, SoftDeleteOptions};
use super::tenant::build_tenant_filter;
use super::webhook::{
    WebhookNotifier, WebhookOptions, WebhookPayload, WebhookQuery, QUERY_COMPLETED_EVENT,
};
use crate::cache::{CacheManager, CacheOptions, CacheStore, RedisCacheStore};
use crate::config::Config;
use crate::errors::QueryError;
use crate::metrics::{MetricsHub, QueryMetrics};
use crate::query::builder::{PaginatedResponse, QueryBuilder, QueryOptions};
use crate::query::filters::FilterMap;

/// State shared by the query add-ons: cache store, metrics subscribers,
/// presets and the webhook client. Each context is isolated from every other.
pub struct QueryContext {
    config: Config,
    cache: CacheManager,
    monitor: QueryMonitor,
    presets: PresetStore,
    webhooks: WebhookNotifier,
}

impl QueryContext {
    /// Context with an in-memory cache store
    pub fn new(config: Config) -> Result<Self> {
        let cache = CacheManager::in_memory(config.cache.default_ttl());
        let monitor = QueryMonitor::new(
            MetricsHub::new(),
            config.monitoring.slow_query_threshold(),
        );
        let webhooks = WebhookNotifier::new(&config.webhook)?;

        Ok(Self {
            config,
            cache,
            monitor,
            presets: PresetStore::new(),
            webhooks,
        })
    }

    /// Context built from environment configuration. Uses Redis for caching
    /// when it is enabled there.
    pub async fn from_env() -> Result<Self> {
        let config = Config::from_env()?;
        let redis = config.cache.redis.clone();
        let mut context = Self::new(config)?;

        if let Some(redis_config) = redis {
            info!("Using Redis cache store at {}", redis_config.url);
            let store = RedisCacheStore::new(redis_config)
                .await
                .map_err(|e| QueryError::Cache(format!("{:#}", e)))?;
            context.set_cache_store(Arc::new(store));
        }

        Ok(context)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn metrics(&self) -> &MetricsHub {
        self.monitor.hub()
    }

    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    pub fn set_cache_store(&mut self, store: Arc<dyn CacheStore>) {
        self.cache.set_store(store);
    }

    pub async fn cached_query(
        &self,
        builder: &QueryBuilder,
        options: &QueryOptions,
        cache: &CacheOptions,
    ) -> Result<PaginatedResponse> {
        self.cache.cached_query(builder, options, cache).await
    }

    pub async fn monitored_query(
        &self,
        builder: &QueryBuilder,
        options: &QueryOptions,
    ) -> Result<PaginatedResponse> {
        self.monitor.monitored_query(builder, options).await
    }

    /// Register a callback run after every monitored query
    pub async fn on_query_metrics<F>(&self, callback: F)
    where
        F: Fn(&QueryMetrics) + Send + Sync + 'static,
    {
        self.monitor.hub().subscribe(callback).await;
    }

    /// Run the query with soft-deleted rows hidden (or selected, per
    /// `soft_delete`). The soft-delete condition replaces any caller filter on
    /// the same field.
    pub async fn soft_delete_query(
        &self,
        builder: &QueryBuilder,
        options: &QueryOptions,
        soft_delete: &SoftDeleteOptions,
    ) -> Result<PaginatedResponse> {
        let scoped = with_filters(options, build_soft_delete_filter(soft_delete));
        builder.execute(&scoped).await
    }

    /// Run the query restricted to one tenant's rows
    pub async fn tenant_query(
        &self,
        builder: &QueryBuilder,
        options: &QueryOptions,
        tenant_id: impl Into<Value>,
        tenant_field: &str,
    ) -> Result<PaginatedResponse> {
        let scoped = with_filters(options, build_tenant_filter(tenant_id, tenant_field));
        builder.execute(&scoped).await
    }

    pub async fn query_and_export_csv(
        &self,
        builder: &QueryBuilder,
        options: &QueryOptions,
    ) -> Result<String> {
        let rows = builder
            .fetch_for_export(options, self.config.export.max_rows)
            .await?;
        debug!("Exporting {} rows as CSV", rows.len());
        Ok(to_csv(&rows))
    }

    pub async fn query_and_export_json(
        &self,
        builder: &QueryBuilder,
        options: &QueryOptions,
        pretty: bool,
    ) -> Result<String> {
        let rows = builder
            .fetch_for_export(options, self.config.export.max_rows)
            .await?;
        debug!("Exporting {} rows as JSON", rows.len());
        Ok(to_json(&rows, pretty)?)
    }

    /// Run a saved preset with `overrides` merged over its stored options
    pub async fn execute_preset(
        &self,
        builder: &QueryBuilder,
        name: &str,
        overrides: Map<String, Value>,
    ) -> Result<PaginatedResponse> {
        let options = self.presets.resolve(name, overrides).await?;
        builder.execute(&options).await
    }

    /// Run the query, then POST the result to `url` in the background. The
    /// query result does not depend on the delivery.
    pub async fn query_with_webhook(
        &self,
        builder: &QueryBuilder,
        options: &QueryOptions,
        url: &str,
        webhook: WebhookOptions,
    ) -> Result<WebhookQuery> {
        let response = builder.execute(options).await?;

        let query = if webhook.include_query {
            Some(serde_json::to_value(options)?)
        } else {
            None
        };

        let payload = WebhookPayload {
            event: QUERY_COMPLETED_EVENT.to_string(),
            model: builder.model_name().to_string(),
            timestamp: Utc::now(),
            result: response.clone(),
            query,
        };

        let delivery = self.webhooks.spawn_delivery(url.to_string(), payload);

        Ok(WebhookQuery { response, delivery })
    }
}

fn with_filters(options: &QueryOptions, extra: FilterMap) -> QueryOptions {
    let mut scoped = options.clone();
    scoped.conditions.filters.extend(extra);
    scoped
}
