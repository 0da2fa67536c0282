use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub cache: CacheConfig,
    pub monitoring: MonitoringConfig,
    pub export: ExportConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl_seconds: u64,
    pub redis: Option<RedisConfig>,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub key_prefix: String,
    pub max_value_size_mb: usize,
}

#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub max_rows: i64,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 60,
            redis: None,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "query-shaper:".to_string(),
            max_value_size_mb: 10,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 1000,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { max_rows: 10_000 }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: concat!("query-shaper/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

impl MonitoringConfig {
    pub fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_threshold_ms)
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Parse `name` from the environment, or fall back to `default` when unset
fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from the environment (and `.env`, when present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            cache: CacheConfig {
                default_ttl_seconds: env_or(
                    "QUERY_CACHE_TTL_SECONDS",
                    defaults.cache.default_ttl_seconds,
                )?,
                redis: Self::redis_config_from_env()?,
            },
            monitoring: MonitoringConfig {
                slow_query_threshold_ms: env_or(
                    "QUERY_SLOW_THRESHOLD_MS",
                    defaults.monitoring.slow_query_threshold_ms,
                )?,
            },
            export: ExportConfig {
                max_rows: env_or("QUERY_EXPORT_MAX_ROWS", defaults.export.max_rows)?,
            },
            webhook: WebhookConfig {
                timeout_seconds: env_or(
                    "WEBHOOK_TIMEOUT_SECONDS",
                    defaults.webhook.timeout_seconds,
                )?,
                user_agent: env::var("WEBHOOK_USER_AGENT").unwrap_or(defaults.webhook.user_agent),
            },
        })
    }

    /// Redis is opt-in through REDIS_ENABLED=true
    fn redis_config_from_env() -> Result<Option<RedisConfig>> {
        let enabled = env::var("REDIS_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if !enabled {
            return Ok(None);
        }

        let defaults = RedisConfig::default();
        Ok(Some(RedisConfig {
            url: env::var("REDIS_URL").unwrap_or(defaults.url),
            key_prefix: env::var("REDIS_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            max_value_size_mb: env_or("REDIS_MAX_VALUE_SIZE_MB", defaults.max_value_size_mb)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.cache.default_ttl(), Duration::from_secs(60));
        assert!(config.cache.redis.is_none());
        assert_eq!(config.monitoring.slow_query_threshold(), Duration::from_millis(1000));
        assert_eq!(config.export.max_rows, 10_000);
        assert_eq!(config.webhook.timeout(), Duration::from_secs(10));
        assert!(config.webhook.user_agent.starts_with("query-shaper/"));
    }

    #[test]
    fn test_env_or_parses_and_rejects() {
        env::set_var("QUERY_SHAPER_TEST_NUMBER", " 42 ");
        env::set_var("QUERY_SHAPER_TEST_GARBAGE", "forty-two");

        assert_eq!(env_or("QUERY_SHAPER_TEST_NUMBER", 1u64).unwrap(), 42);
        assert_eq!(env_or("QUERY_SHAPER_TEST_UNSET", 7u64).unwrap(), 7);
        assert!(env_or("QUERY_SHAPER_TEST_GARBAGE", 1u64).is_err());
    }
}
