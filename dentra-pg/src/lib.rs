//! Dentra PG - PostgreSQL Record Store
//!
//! Durable implementation of the `dentra-engine` [`RecordStore`] seam over
//! deadpool-postgres, plus the pool configuration. Statement construction
//! lives in a private module driven entirely by the entity catalog; nothing
//! here accepts SQL identifiers from callers.
//!
//! [`RecordStore`]: dentra_engine::RecordStore

pub mod config;
mod sql;
pub mod store;

pub use config::PgConfig;
pub use store::PgRecordStore;
