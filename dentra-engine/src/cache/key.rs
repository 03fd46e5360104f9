//! Tenant-scoped cache keys.
//!
//! Key format: `{namespace}:{tenant}:{discriminators...}:page:{p}:limit:{l}`
//! for list reads and `{namespace}:{tenant}:id:{id}` for single-record
//! reads. The namespace comes from [`EntityKind::namespace`] and the tenant
//! segment is `global` for tenant-global entities, so every key for one
//! entity under one tenant shares the prefix returned by
//! [`CacheKey::prefix`] - which is exactly what invalidation deletes by.

use dentra_core::{EntityKind, RecordId, TenantId};
use std::fmt;
use std::fmt::Write as _;

const GLOBAL_SEGMENT: &str = "global";

/// A fully-built cache key. Construction always goes through
/// [`CacheKey::builder`], which requires the entity and tenant scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    key: String,
}

impl CacheKey {
    /// Start building a key for one entity under one tenant scope.
    pub fn builder(entity: EntityKind, tenant_id: Option<TenantId>) -> CacheKeyBuilder {
        let mut buf = String::new();
        buf.push_str(entity.namespace());
        buf.push(':');
        match tenant_id {
            Some(t) => {
                let _ = write!(buf, "{}", t);
            }
            None => buf.push_str(GLOBAL_SEGMENT),
        }
        CacheKeyBuilder { buf }
    }

    /// The invalidation prefix covering every key built for this entity and
    /// tenant scope, whatever its discriminators, page, or limit.
    pub fn prefix(entity: EntityKind, tenant_id: Option<TenantId>) -> String {
        let mut buf = Self::builder(entity, tenant_id).buf;
        buf.push(':');
        buf
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Builder for [`CacheKey`].
pub struct CacheKeyBuilder {
    buf: String,
}

impl CacheKeyBuilder {
    /// Add a named discriminator (additional scoping parameter of the read,
    /// e.g. `status_type_id`).
    pub fn discriminator(mut self, name: &str, value: impl fmt::Display) -> Self {
        let _ = write!(self.buf, ":{}:{}", name, value);
        self
    }

    /// Finish as a list key with page and limit.
    pub fn page(mut self, page: i64, limit: i64) -> CacheKey {
        let _ = write!(self.buf, ":page:{}:limit:{}", page, limit);
        CacheKey { key: self.buf }
    }

    /// Finish as a single-record key.
    pub fn record(mut self, id: RecordId) -> CacheKey {
        let _ = write!(self.buf, ":id:{}", id);
        CacheKey { key: self.buf }
    }
}
