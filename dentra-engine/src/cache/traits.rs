//! Cache backend trait.
//!
//! Abstracts over the key/value service (in-memory for tests, Redis-style
//! in production). Implementations must be thread-safe, honor TTLs, and
//! support deletion of every entry under a key prefix.

use async_trait::async_trait;
use dentra_core::EngineResult;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a cached value, or `None` on miss or expiry.
    async fn get(&self, key: &str) -> EngineResult<Option<Value>>;

    /// Store a value under `key` for `ttl`.
    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> EngineResult<()>;

    /// Delete every entry whose key starts with `prefix`, returning how many
    /// were removed. All-or-nothing for the matched set: no partial state is
    /// repaired by readers.
    async fn delete_by_prefix(&self, prefix: &str) -> EngineResult<u64>;

    /// Usage counters for observability.
    async fn stats(&self) -> EngineResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (including expired entries).
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of entries removed by prefix invalidation.
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
