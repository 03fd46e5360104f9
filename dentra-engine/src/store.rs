//! Record store abstraction.
//!
//! Minimal CRUD primitives over a durable tenant-scoped record store. Every
//! multi-row read takes an explicit limit/offset; every write against a
//! tenant-scoped entity is scoped by tenant id plus primary key, so a
//! cross-tenant mutation is unrepresentable at this seam. Implementations
//! acquire one connection per logical operation and release it on every exit
//! path.

use async_trait::async_trait;
use dentra_core::{EngineResult, EntityKind, RecordId, TenantId};
use serde_json::Value;

/// A candidate or stored record: column name to JSON value.
pub type Record = serde_json::Map<String, Value>;

/// Equality filter on one column.
///
/// Column names are `&'static str` on purpose: they come from descriptor
/// code, never from request input, which closes off identifier injection by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Filter {
            column,
            value: value.into(),
        }
    }
}

/// Page specification for multi-row reads. No unbounded scans.
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub limit: i64,
    pub offset: i64,
    /// Optional order column; must name a schema column of the entity.
    pub order_by: Option<&'static str>,
}

impl PageSpec {
    pub fn new(limit: i64, offset: i64) -> Self {
        PageSpec {
            limit,
            offset,
            order_by: None,
        }
    }

    pub fn with_order(mut self, column: &'static str) -> Self {
        self.order_by = Some(column);
        self
    }
}

/// CRUD primitives the validator, existence checker, and orchestration
/// depend on.
///
/// `tenant_id` is `None` only for tenant-global entities (the tenant table
/// itself); implementations must scope every other query by it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record, returning the generated primary key.
    ///
    /// Uniqueness violations surface as [`dentra_core::EngineError::Conflict`],
    /// missing foreign keys as `NotFound`, infrastructure failures as
    /// `Store` - callers must be able to map them to distinct responses.
    async fn create(&self, entity: EntityKind, record: &Record) -> EngineResult<RecordId>;

    /// Fetch a page of records matching the filters.
    async fn fetch_page(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        filters: &[Filter],
        page: PageSpec,
    ) -> EngineResult<Vec<Record>>;

    /// Fetch a single record by primary key.
    async fn fetch_one(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        id: RecordId,
    ) -> EngineResult<Option<Record>>;

    /// Update the given columns of one record, returning the affected-row
    /// count (0 when the row does not exist under the tenant).
    async fn update(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        id: RecordId,
        changes: &Record,
    ) -> EngineResult<u64>;

    /// Delete one record, returning the affected-row count (0 when absent).
    async fn delete(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        id: RecordId,
    ) -> EngineResult<u64>;

    /// Count rows matching the filters, optionally excluding rows that match
    /// `exclude` (backs the "unique among siblings other than myself" check).
    async fn count_where(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        filters: &[Filter],
        exclude: Option<&Filter>,
    ) -> EngineResult<u64>;
}
