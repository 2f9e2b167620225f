pub mod invalidation;
pub mod keys;
pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

pub use invalidation::{EntityKind, Lineage, MutationEvent, affected_keys};
pub use memory::MemoryCache;
pub use self::redis::RedisCache;

/// Key-value cache with per-entry TTL.
///
/// No atomicity is assumed across calls.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn connect(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
