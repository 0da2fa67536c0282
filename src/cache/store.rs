use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Pluggable key/value store for cached query results
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short store name used as a metrics label
    fn name(&self) -> &'static str;

    /// Unexpired value for `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value`; `None` keeps it until deleted or cleared
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Entry count above which `set` sweeps out every expired entry
const SWEEP_THRESHOLD: usize = 1024;

/// Process-local store backed by a map. Expired entries are evicted when read,
/// and swept in bulk by `set` once the map grows past a threshold.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        debug!("Evicting expired cache entry: {}", key);
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            expires_at: ttl.map(|ttl| now + ttl),
        };

        let mut entries = self.entries.write().await;
        if entries.len() >= SWEEP_THRESHOLD {
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            debug!("Swept {} expired cache entries", before - entries.len());
        }
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
