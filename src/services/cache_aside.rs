//! Read-through / write-invalidate control flow.
//!
//! Reads: derive key, try the cache, on a miss build the view and store it
//! with a TTL. Writes: the caller persists first, then hands the mutation
//! events here so the affected keys are deleted. The cache is never a source
//! of truth, so any cache failure on either path is logged and swallowed.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::cache::{CacheStore, MutationEvent, affected_keys};
use crate::error::AppError;

/// Lifetimes for cached entries.
///
/// `view` covers composite course/module/lesson views, which are rebuilt on
/// invalidation. `listing` covers quiz and enrollment views that churn often;
/// there the TTL bounds how long a missed invalidation can linger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub view: Duration,
    pub listing: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            view: Duration::from_secs(3600),
            listing: Duration::from_secs(60),
        }
    }
}

#[derive(Clone)]
pub struct CacheAside {
    cache: Arc<dyn CacheStore>,
}

impl CacheAside {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    pub async fn read_through<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        build: F,
    ) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(view) => {
                    debug!(key = %key, "cache hit");
                    return Ok(view);
                }
                Err(e) => warn!(key = %key, error = %e, "discarding undecodable cache entry"),
            },
            Ok(None) => debug!(key = %key, "cache miss"),
            Err(e) => warn!(key = %key, error = %e, "cache read failed, rebuilding view"),
        }

        let view = build().await?;

        match serde_json::to_string(&view) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(key, &raw, ttl).await {
                    warn!(key = %key, error = %e, "cache populate failed");
                } else {
                    debug!(key = %key, ttl_secs = ttl.as_secs(), "cache populated");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "view not serializable, skipping cache"),
        }

        Ok(view)
    }

    /// Deletes every key made stale by `events`.
    ///
    /// Must only be called once the write is committed. Returns the keys that
    /// were targeted, whether or not each delete succeeded.
    pub async fn invalidate(&self, events: &[MutationEvent]) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        for event in events {
            match affected_keys(event) {
                Ok(found) => keys.extend(found),
                Err(e) => error!(
                    entity = ?event.kind,
                    id = %event.id,
                    error = %e,
                    "cannot derive invalidation keys"
                ),
            }
        }

        for key in &keys {
            match self.cache.delete(key).await {
                Ok(()) => debug!(key = %key, "cache invalidated"),
                Err(e) => warn!(
                    key = %key,
                    error = %e,
                    "cache delete failed, entry will expire by TTL"
                ),
            }
        }

        keys
    }
}
