use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::key::generate_cache_key;
use super::store::{CacheStore, MemoryCacheStore};
use crate::metrics::registry::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};
use crate::query::builder::{PaginatedResponse, QueryBuilder, QueryOptions};

/// Per-call cache settings
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Explicit key; generated from the query options when absent
    pub key: Option<String>,
    /// Entry lifetime; the manager default when absent
    pub ttl: Option<Duration>,
}

/// Read-through cache in front of [`QueryBuilder::execute`]
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    /// Manager over a fresh in-memory store
    pub fn in_memory(default_ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()), default_ttl)
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Swap the backing store. Entries in the previous store are not migrated.
    pub fn set_store(&mut self, store: Arc<dyn CacheStore>) {
        info!("Cache store replaced with {}", store.name());
        self.store = store;
    }

    /// Return the cached envelope for these options, or run the query and
    /// cache its result. The cache is best-effort: store failures are logged
    /// and never fail the query.
    pub async fn cached_query(
        &self,
        builder: &QueryBuilder,
        options: &QueryOptions,
        cache: &CacheOptions,
    ) -> Result<PaginatedResponse> {
        let key = cache
            .key
            .clone()
            .unwrap_or_else(|| generate_cache_key(builder.model_name(), options));
        let store_name = self.store.name();

        // Store failures degrade to a miss
        match self.store.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_value::<PaginatedResponse>(cached) {
                Ok(response) => {
                    CACHE_HITS_TOTAL.with_label_values(&[store_name]).inc();
                    debug!("Cache hit for key: {}", key);
                    return Ok(response);
                }
                Err(e) => {
                    // Unreadable entry, fall through and overwrite it
                    warn!("Discarding unreadable cache entry {}: {}", key, e);
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!("Cache store {} read failed for {}: {:#}", store_name, key, e);
            }
        }

        CACHE_MISSES_TOTAL.with_label_values(&[store_name]).inc();
        debug!("Cache miss for key: {}", key);

        let response = builder.execute(options).await?;

        let ttl = cache.ttl.unwrap_or(self.default_ttl);
        let write = match serde_json::to_value(&response) {
            Ok(value) => self.store.set(&key, value, Some(ttl)).await,
            Err(e) => Err(e.into()),
        };
        match write {
            Ok(()) => info!(
                "Cached {} rows for key {} (ttl {:?})",
                response.data.len(),
                key,
                ttl
            ),
            Err(e) => warn!("Cache store {} write failed for {}: {:#}", store_name, key, e),
        }

        Ok(response)
    }

    /// Drop a single cached entry
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        self.store.delete(key).await
    }

    /// Drop every cached entry
    pub async fn invalidate_all(&self) -> Result<()> {
        self.store.clear().await?;
        debug!("Cache store {} cleared", self.store.name());
        Ok(())
    }
}
