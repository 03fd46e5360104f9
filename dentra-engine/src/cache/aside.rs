//! Read-through/cache-aside orchestration over a [`CacheBackend`].

use crate::cache::key::CacheKey;
use crate::cache::traits::CacheBackend;
use dentra_core::{EngineResult, EntityKind, TenantId};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the cache-aside layer.
///
/// TTL must be finite: a crash between store commit and invalidation leaves
/// a stale entry whose lifetime is bounded only by this TTL.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied when the caller does not supply one.
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Cache-aside layer: read-through on gets, prefix invalidation on writes.
pub struct CacheAside<C: CacheBackend> {
    backend: Arc<C>,
    config: CacheConfig,
}

impl<C: CacheBackend> CacheAside<C> {
    pub fn new(backend: Arc<C>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn with_defaults(backend: Arc<C>) -> Self {
        Self::new(backend, CacheConfig::default())
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the cached value for `key`, or run `producer`, cache its
    /// result under `key`, and return it.
    ///
    /// The cache is not the source of truth, so backend failures on the read
    /// or write side degrade to the producer path with a warning instead of
    /// failing the request. Producer errors always propagate.
    pub async fn get_or_set<F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Option<Duration>,
        producer: F,
    ) -> EngineResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EngineResult<Value>>,
    {
        match self.backend.get(key.as_str()).await {
            Ok(Some(value)) => {
                debug!(key = %key, "cache hit");
                return Ok(value);
            }
            Ok(None) => {
                debug!(key = %key, "cache miss");
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, falling back to store");
            }
        }

        let value = producer().await?;
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        if let Err(e) = self.backend.set(key.as_str(), &value, ttl).await {
            warn!(key = %key, error = %e, "cache write failed, serving uncached");
        }
        Ok(value)
    }

    /// Delete every cached entry for `entity` under `tenant_id`.
    ///
    /// Called immediately after every create/update/delete. Errors propagate:
    /// a silently failed invalidation would leave staleness bounded only by
    /// TTL, which callers must be able to notice.
    pub async fn invalidate_entity(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
    ) -> EngineResult<u64> {
        let prefix = CacheKey::prefix(entity, tenant_id);
        let removed = self.backend.delete_by_prefix(&prefix).await?;
        debug!(prefix = %prefix, removed, "cache invalidated");
        Ok(removed)
    }
}

impl<C: CacheBackend> Clone for CacheAside<C> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
        }
    }
}
