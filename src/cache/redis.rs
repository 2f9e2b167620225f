//! Redis-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::CacheStore;
use crate::error::CacheError;

pub struct RedisCache {
    client: redis::Client,
    conn: RwLock<Option<ConnectionManager>>,
}

impl RedisCache {
    pub fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            conn: RwLock::new(None),
        })
    }

    /// The manager is cheap to clone; the lock is released before any command runs.
    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        self.conn.read().await.clone().ok_or(CacheError::Disconnected)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn connect(&self) -> Result<(), CacheError> {
        let manager = ConnectionManager::new(self.client.clone()).await?;
        *self.conn.write().await = Some(manager);
        info!("Redis connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), CacheError> {
        if self.conn.write().await.take().is_some() {
            info!("Redis disconnected");
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        debug!(key = %key, ttl_secs = %ttl_secs, "redis set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_url() {
        assert!(RedisCache::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_commands_before_connect_fail_fast() {
        let cache = RedisCache::new("redis://127.0.0.1:6379").unwrap();
        assert!(matches!(cache.get("course:C1").await, Err(CacheError::Disconnected)));
        assert!(matches!(cache.delete("course:C1").await, Err(CacheError::Disconnected)));
    }
}
