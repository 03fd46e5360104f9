//! In-memory cache backend with TTL expiry and prefix deletion.
//!
//! Backs tests and single-process deployments. Expired entries are evicted
//! lazily on read and count as misses.

use crate::cache::traits::{CacheBackend, CacheStats};
use async_trait::async_trait;
use dentra_core::EngineResult;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct Entry {
    value: Value,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<String, Entry>>,
    stats: RwLock<CacheStats>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of live (possibly expired, not yet evicted) entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> EngineResult<Option<Value>> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut stats = self.stats.write().unwrap_or_else(|e| e.into_inner());

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                stats.hits += 1;
                Ok(Some(entry.value.clone()))
            }
            Some(_) => {
                entries.remove(key);
                stats.misses += 1;
                Ok(None)
            }
            None => {
                stats.misses += 1;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> EngineResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> EngineResult<u64> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = (before - entries.len()) as u64;

        let mut stats = self.stats.write().unwrap_or_else(|e| e.into_inner());
        stats.invalidations += removed;
        Ok(removed)
    }

    async fn stats(&self) -> EngineResult<CacheStats> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut stats = self
            .stats
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        stats.entry_count = entries.len() as u64;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = InMemoryCacheBackend::new();
        cache.set("patient:1:id:5", &json!({"patient_name": "Ada"}), TTL)
            .await
            .unwrap();

        let hit = cache.get("patient:1:id:5").await.unwrap();
        assert_eq!(hit, Some(json!({"patient_name": "Ada"})));

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = InMemoryCacheBackend::new();
        cache
            .set("patient:1:id:5", &json!(1), Duration::from_millis(0))
            .await
            .unwrap();

        assert_eq!(cache.get("patient:1:id:5").await.unwrap(), None);
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 0);
    }

    #[tokio::test]
    async fn test_delete_by_prefix_removes_only_matching_keys() {
        let cache = InMemoryCacheBackend::new();
        for key in [
            "statusTypeSub:1:page:1:limit:10",
            "statusTypeSub:1:page:2:limit:10",
            "statusTypeSub:1:status_type_id:3:page:1:limit:10",
            "statusTypeSub:2:page:1:limit:10",
            "statusType:1:page:1:limit:10",
        ] {
            cache.set(key, &json!([]), TTL).await.unwrap();
        }

        let removed = cache.delete_by_prefix("statusTypeSub:1:").await.unwrap();
        assert_eq!(removed, 3);

        // Other tenants and other entities are untouched.
        assert!(cache.get("statusTypeSub:2:page:1:limit:10").await.unwrap().is_some());
        assert!(cache.get("statusType:1:page:1:limit:10").await.unwrap().is_some());
    }
}
