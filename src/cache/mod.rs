pub mod key;
pub mod manager;
pub mod redis;
pub mod store;

pub use key::generate_cache_key;
pub use manager::{CacheManager, CacheOptions};
pub use self::redis::RedisCacheStore;
pub use store::{CacheStore, MemoryCacheStore};
