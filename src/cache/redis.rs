//! Redis-backed [`CacheStore`], shared by every process pointed at the same
//! server. Without the `redis_cache` feature, [`RedisCacheStore::new`] fails
//! and no store can be constructed.

#[cfg(feature = "redis_cache")]
pub use self::enabled::RedisCacheStore;

#[cfg(not(feature = "redis_cache"))]
pub use self::disabled::RedisCacheStore;

#[cfg(feature = "redis_cache")]
mod enabled {
    use anyhow::{Context, Result};
    use async_trait::async_trait;
    use redis::{aio::ConnectionManager, AsyncCommands, Client};
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use std::time::Duration;
    use tracing::{debug, warn};

    use crate::cache::store::CacheStore;
    use crate::config::RedisConfig;

    /// Stored form of a cached value
    #[derive(Debug, Serialize, Deserialize)]
    struct StoredValue {
        value: Value,
        stored_at: i64,
    }

    pub struct RedisCacheStore {
        connection: ConnectionManager,
        config: RedisConfig,
    }

    impl RedisCacheStore {
        pub async fn new(config: RedisConfig) -> Result<Self> {
            let client = Client::open(config.url.as_str())
                .with_context(|| format!("Invalid Redis URL: {}", config.url))?;
            let connection = ConnectionManager::new(client)
                .await
                .context("Failed to connect to Redis")?;

            debug!("Connected to Redis cache store, prefix {}", config.key_prefix);
            Ok(Self { connection, config })
        }

        fn namespaced(&self, key: &str) -> String {
            format!("{}{}", self.config.key_prefix, key)
        }

        fn max_value_bytes(&self) -> usize {
            self.config.max_value_size_mb * 1024 * 1024
        }
    }

    #[async_trait]
    impl CacheStore for RedisCacheStore {
        fn name(&self) -> &'static str {
            "redis"
        }

        async fn get(&self, key: &str) -> Result<Option<Value>> {
            let mut conn = self.connection.clone();
            let raw: Option<String> = conn
                .get(self.namespaced(key))
                .await
                .with_context(|| format!("Redis GET failed for {}", key))?;

            let Some(raw) = raw else {
                return Ok(None);
            };
            let stored: StoredValue =
                serde_json::from_str(&raw).context("Cached value is not valid JSON")?;
            Ok(Some(stored.value))
        }

        async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
            let stored = StoredValue {
                value,
                stored_at: chrono::Utc::now().timestamp(),
            };
            let raw = serde_json::to_string(&stored)?;

            if raw.len() > self.max_value_bytes() {
                warn!(
                    "Skipping cache write for {}: {} bytes exceeds {} MB",
                    key,
                    raw.len(),
                    self.config.max_value_size_mb
                );
                return Ok(());
            }

            let mut conn = self.connection.clone();
            let key = self.namespaced(key);

            // SETEX rejects a zero expiry
            if let Some(ttl) = ttl {
                conn.set_ex::<_, _, ()>(&key, raw, ttl.as_secs().max(1))
                    .await
                    .with_context(|| format!("Redis SETEX failed for {}", key))?;
            } else {
                conn.set::<_, _, ()>(&key, raw)
                    .await
                    .with_context(|| format!("Redis SET failed for {}", key))?;
            }
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            let mut conn = self.connection.clone();
            conn.del::<_, ()>(self.namespaced(key))
                .await
                .with_context(|| format!("Redis DEL failed for {}", key))
        }

        /// Removes only keys under this store's prefix
        async fn clear(&self) -> Result<()> {
            let pattern = format!("{}*", self.config.key_prefix);

            let mut scan_conn = self.connection.clone();
            let mut keys: Vec<String> = Vec::new();
            {
                let mut iter = scan_conn
                    .scan_match::<_, String>(&pattern)
                    .await
                    .context("Redis SCAN failed")?;
                while let Some(key) = iter.next_item().await {
                    keys.push(key);
                }
            }

            if !keys.is_empty() {
                let mut conn = self.connection.clone();
                conn.del::<_, ()>(&keys)
                    .await
                    .context("Redis DEL failed while clearing")?;
            }

            debug!("Cleared {} Redis cache keys matching {}", keys.len(), pattern);
            Ok(())
        }
    }
}

#[cfg(not(feature = "redis_cache"))]
mod disabled {
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::time::Duration;

    use crate::cache::store::CacheStore;
    use crate::config::RedisConfig;

    /// Placeholder; cannot be constructed without the `redis_cache` feature
    pub struct RedisCacheStore {
        _private: (),
    }

    impl RedisCacheStore {
        pub async fn new(config: RedisConfig) -> Result<Self> {
            anyhow::bail!(
                "Cannot connect to {}: built without the redis_cache feature",
                config.url
            )
        }
    }

    #[async_trait]
    impl CacheStore for RedisCacheStore {
        fn name(&self) -> &'static str {
            "redis"
        }

        async fn get(&self, _key: &str) -> Result<Option<Value>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: Value, _ttl: Option<Duration>) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

}
