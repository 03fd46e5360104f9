//! Dentra Core - Entity Catalog and Schema Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains the closed entity catalog, the declarative column
//! schemas interpreted by the validator, and the error taxonomy shared by
//! every layer - no business logic.

pub mod catalog;
pub mod entity;
pub mod error;
pub mod schema;

pub use catalog::{descriptor, EntityDescriptor, ReferenceRule, UniqueRule};
pub use entity::EntityKind;
pub use error::{EngineError, EngineResult, StoreError, ValidationError};
pub use schema::{ColumnKind, ColumnRule, Schema, SchemaBuilder};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Tenant identifier. Tenants are the top-level isolation boundary; every
/// row of a tenant-scoped table carries one and every query must scope by it.
pub type TenantId = i64;

/// Primary-key identifier for any entity row (bigint auto-increment).
pub type RecordId = i64;
