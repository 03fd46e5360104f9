//! Dentra Engine - Validation, Existence Checks, Storage and Cache Seams
//!
//! The generic tenant-scoped CRUD engine every entity service delegates to:
//! a declarative column validator, a referential existence checker, the
//! record-store abstraction (with an in-memory implementation for tests and
//! local development), the cache-aside layer with prefix invalidation, and
//! the per-entity orchestration that composes them.
//!
//! The durable PostgreSQL implementation of [`RecordStore`] lives in
//! `dentra-pg`.

pub mod cache;
pub mod exists;
pub mod memory;
pub mod service;
pub mod store;
pub mod validator;

pub use cache::{
    CacheAside, CacheBackend, CacheConfig, CacheKey, CacheKeyBuilder, CacheStats,
    InMemoryCacheBackend,
};
pub use exists::ReferentialChecker;
pub use memory::InMemoryRecordStore;
pub use service::EntityService;
pub use store::{Filter, PageSpec, Record, RecordStore};
pub use validator::validate;
