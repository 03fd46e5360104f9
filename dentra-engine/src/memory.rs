//! In-memory record store for tests and local development.
//!
//! Implements [`RecordStore`] over per-entity `BTreeMap`s guarded by a
//! `std::sync::RwLock`. Constraint enforcement (uniqueness, foreign keys)
//! is deliberately absent: the orchestration layer pre-checks both, and the
//! durable Postgres store is the backstop in production.

use crate::store::{Filter, PageSpec, Record, RecordStore};
use async_trait::async_trait;
use dentra_core::{EngineError, EngineResult, EntityKind, RecordId, StoreError, TenantId};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

type Table = BTreeMap<RecordId, Record>;

#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<EntityKind, Table>>,
    next_id: RwLock<HashMap<EntityKind, RecordId>>,
    create_calls: AtomicU64,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create` calls received, including failed ones. Lets tests
    /// assert that a rejected write never reached the store.
    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of rows currently stored for an entity, across all tenants.
    pub fn row_count(&self, entity: EntityKind) -> usize {
        self.tables()
            .get(&entity)
            .map(|t| t.len())
            .unwrap_or(0)
    }

    fn tables(&self) -> std::sync::RwLockReadGuard<'_, HashMap<EntityKind, Table>> {
        // Lock poisoning only happens after a panic in another test thread.
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn tables_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<EntityKind, Table>> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    fn allocate_id(&self, entity: EntityKind) -> RecordId {
        let mut ids = self.next_id.write().unwrap_or_else(|e| e.into_inner());
        let next = ids.entry(entity).or_insert(1);
        let id = *next;
        *next += 1;
        id
    }

    fn in_tenant(entity: EntityKind, tenant_id: Option<TenantId>, row: &Record) -> bool {
        match tenant_id {
            Some(t) if entity.tenant_scoped() => {
                row.get("tenant_id").and_then(Value::as_i64) == Some(t)
            }
            _ => true,
        }
    }

    fn matches(row: &Record, filters: &[Filter]) -> bool {
        filters
            .iter()
            .all(|f| values_match(row.get(f.column), Some(&f.value)))
    }
}

/// Loose equality: numbers compare by value (5 == 5.0 == "5"), everything
/// else by JSON equality. Mirrors how the SQL store compares after casts.
fn values_match(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (None, None) => true,
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, entity: EntityKind, record: &Record) -> EngineResult<RecordId> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.allocate_id(entity);
        let mut row = record.clone();
        row.insert(entity.id_column().to_string(), Value::from(id));
        self.tables_mut().entry(entity).or_default().insert(id, row);
        Ok(id)
    }

    async fn fetch_page(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        filters: &[Filter],
        page: PageSpec,
    ) -> EngineResult<Vec<Record>> {
        if page.limit < 0 || page.offset < 0 {
            return Err(EngineError::Store(StoreError::operation_failed(
                entity,
                "fetch_page",
                "negative limit or offset",
            )));
        }
        let tables = self.tables();
        let mut rows: Vec<Record> = tables
            .get(&entity)
            .into_iter()
            .flat_map(|t| t.values())
            .filter(|row| Self::in_tenant(entity, tenant_id, row))
            .filter(|row| Self::matches(row, filters))
            .cloned()
            .collect();

        if let Some(order) = page.order_by {
            rows.sort_by(|a, b| {
                let ax = a.get(order);
                let bx = b.get(order);
                match (ax.and_then(as_number), bx.and_then(as_number)) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
                    _ => format!("{:?}", ax).cmp(&format!("{:?}", bx)),
                }
            });
        }

        Ok(rows
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn fetch_one(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        id: RecordId,
    ) -> EngineResult<Option<Record>> {
        let tables = self.tables();
        Ok(tables
            .get(&entity)
            .and_then(|t| t.get(&id))
            .filter(|row| Self::in_tenant(entity, tenant_id, row))
            .cloned())
    }

    async fn update(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        id: RecordId,
        changes: &Record,
    ) -> EngineResult<u64> {
        let mut tables = self.tables_mut();
        let Some(row) = tables.get_mut(&entity).and_then(|t| t.get_mut(&id)) else {
            return Ok(0);
        };
        if !Self::in_tenant(entity, tenant_id, row) {
            return Ok(0);
        }
        for (column, value) in changes {
            if column != entity.id_column() {
                row.insert(column.clone(), value.clone());
            }
        }
        Ok(1)
    }

    async fn delete(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        id: RecordId,
    ) -> EngineResult<u64> {
        let mut tables = self.tables_mut();
        let Some(table) = tables.get_mut(&entity) else {
            return Ok(0);
        };
        let in_scope = table
            .get(&id)
            .map(|row| Self::in_tenant(entity, tenant_id, row))
            .unwrap_or(false);
        if !in_scope {
            return Ok(0);
        }
        table.remove(&id);
        Ok(1)
    }

    async fn count_where(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        filters: &[Filter],
        exclude: Option<&Filter>,
    ) -> EngineResult<u64> {
        let tables = self.tables();
        let count = tables
            .get(&entity)
            .into_iter()
            .flat_map(|t| t.values())
            .filter(|row| Self::in_tenant(entity, tenant_id, row))
            .filter(|row| Self::matches(row, filters))
            .filter(|row| {
                exclude
                    .map(|ex| !values_match(row.get(ex.column), Some(&ex.value)))
                    .unwrap_or(true)
            })
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryRecordStore::new();
        let rec = record(&[("tenant_name", json!("Acme"))]);
        let a = store.create(EntityKind::Tenant, &rec).await.unwrap();
        let b = store.create(EntityKind::Tenant, &rec).await.unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_one_scopes_by_tenant() {
        let store = InMemoryRecordStore::new();
        let rec = record(&[("tenant_id", json!(2)), ("patient_name", json!("Ada"))]);
        let id = store.create(EntityKind::Patient, &rec).await.unwrap();

        let same_tenant = store
            .fetch_one(EntityKind::Patient, Some(2), id)
            .await
            .unwrap();
        assert!(same_tenant.is_some());

        let other_tenant = store
            .fetch_one(EntityKind::Patient, Some(1), id)
            .await
            .unwrap();
        assert!(other_tenant.is_none());
    }

    #[tokio::test]
    async fn test_update_respects_tenant_and_preserves_id() {
        let store = InMemoryRecordStore::new();
        let rec = record(&[("tenant_id", json!(1)), ("patient_name", json!("Ada"))]);
        let id = store.create(EntityKind::Patient, &rec).await.unwrap();

        let mut changes = record(&[("patient_name", json!("Ada L."))]);
        changes.insert("patient_id".to_string(), json!(999));

        let wrong = store
            .update(EntityKind::Patient, Some(7), id, &changes)
            .await
            .unwrap();
        assert_eq!(wrong, 0);

        let affected = store
            .update(EntityKind::Patient, Some(1), id, &changes)
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let row = store
            .fetch_one(EntityKind::Patient, Some(1), id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get("patient_name"), Some(&json!("Ada L.")));
        // The primary key cannot be overwritten through update.
        assert_eq!(row.get("patient_id"), Some(&json!(id)));
    }

    #[tokio::test]
    async fn test_delete_missing_row_returns_zero() {
        let store = InMemoryRecordStore::new();
        let affected = store
            .delete(EntityKind::Patient, Some(1), 42)
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_fetch_page_pagination_and_filters() {
        let store = InMemoryRecordStore::new();
        for i in 0..5 {
            let rec = record(&[
                ("tenant_id", json!(1)),
                ("status_type_id", json!(if i < 3 { 10 } else { 20 })),
                ("status_type_sub_name", json!(format!("sub-{}", i))),
                ("created_by", json!("ADMIN")),
            ]);
            store.create(EntityKind::StatusTypeSub, &rec).await.unwrap();
        }

        let filters = [Filter::eq("status_type_id", 10)];
        let first = store
            .fetch_page(
                EntityKind::StatusTypeSub,
                Some(1),
                &filters,
                PageSpec::new(2, 0),
            )
            .await
            .unwrap();
        assert_eq!(first.len(), 2);

        let second = store
            .fetch_page(
                EntityKind::StatusTypeSub,
                Some(1),
                &filters,
                PageSpec::new(2, 2),
            )
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn test_count_where_with_exclusion() {
        let store = InMemoryRecordStore::new();
        for (id_hint, email) in [("a", "x@acme.com"), ("b", "x@acme.com"), ("c", "y@acme.com")] {
            let rec = record(&[
                ("tenant_id", json!(1)),
                ("dentist_name", json!(id_hint)),
                ("dentist_email", json!(email)),
            ]);
            store.create(EntityKind::Dentist, &rec).await.unwrap();
        }

        let filters = [Filter::eq("dentist_email", "x@acme.com")];
        let total = store
            .count_where(EntityKind::Dentist, Some(1), &filters, None)
            .await
            .unwrap();
        assert_eq!(total, 2);

        let exclude_self = Filter::eq("dentist_id", 1);
        let others = store
            .count_where(EntityKind::Dentist, Some(1), &filters, Some(&exclude_self))
            .await
            .unwrap();
        assert_eq!(others, 1);
    }

    #[tokio::test]
    async fn test_count_scopes_by_tenant() {
        let store = InMemoryRecordStore::new();
        for tenant in [1, 1, 2] {
            let rec = record(&[("tenant_id", json!(tenant)), ("supplier_name", json!("S"))]);
            store.create(EntityKind::Supplier, &rec).await.unwrap();
        }
        let count = store
            .count_where(EntityKind::Supplier, Some(1), &[], None)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
