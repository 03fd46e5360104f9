//! Cache-aside layer with tenant-scoped keys and prefix invalidation.
//!
//! Reads go through [`CacheAside::get_or_set`]; every successful write to an
//! entity invalidates all entries whose key falls under that entity's
//! tenant-scoped prefix, so staleness is bounded by the gap between store
//! commit and invalidation, not by TTL alone.
//!
//! # Key discipline
//!
//! A [`CacheKey`] cannot be constructed without an [`EntityKind`] and a
//! tenant scope, and the invalidation prefix is derived from the same two
//! values. Key construction and invalidation therefore cannot drift apart
//! per call site.
//!
//! The cache is never the source of truth: read and write failures degrade
//! to the producer path with a warning. Invalidation failures propagate,
//! because an unnoticed failed invalidation would extend staleness past the
//! bound the design promises.

pub mod aside;
pub mod key;
pub mod memory_backend;
pub mod traits;

pub use aside::{CacheAside, CacheConfig};
pub use key::{CacheKey, CacheKeyBuilder};
pub use memory_backend::InMemoryCacheBackend;
pub use traits::{CacheBackend, CacheStats};
