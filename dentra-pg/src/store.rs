//! Durable [`RecordStore`] over PostgreSQL.
//!
//! One pooled connection per logical operation. Rows are decoded through
//! `to_jsonb(t)`, so the store never maintains per-entity column lists for
//! reads; the database's own row shape is the contract.
//!
//! The orchestration layer pre-checks uniqueness and references, but the
//! database constraints remain the backstop: a unique violation that slips
//! past the pre-check (concurrent create) still surfaces as a conflict, and
//! a foreign-key violation as not-found.

use crate::config::PgConfig;
use crate::sql;
use async_trait::async_trait;
use deadpool_postgres::Pool;
use dentra_core::{
    descriptor, EngineError, EngineResult, EntityDescriptor, EntityKind, RecordId, StoreError,
    TenantId,
};
use dentra_engine::{Filter, PageSpec, Record, RecordStore};
use serde_json::Value;
use std::collections::HashMap;
use tokio_postgres::error::SqlState;
use tracing::debug;

/// PostgreSQL-backed record store.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: Pool,
    descriptors: HashMap<EntityKind, EntityDescriptor>,
}

impl PgRecordStore {
    pub fn new(pool: Pool) -> Self {
        let descriptors = EntityKind::ALL
            .iter()
            .map(|&kind| (kind, descriptor(kind)))
            .collect();
        Self { pool, descriptors }
    }

    pub fn from_config(config: &PgConfig) -> EngineResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    fn descriptor(&self, entity: EntityKind) -> &EntityDescriptor {
        // The map is seeded from EntityKind::ALL in new().
        &self.descriptors[&entity]
    }

    async fn conn(&self) -> EngineResult<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::pool_failed(e.to_string()).into())
    }

    fn map_error(
        entity: EntityKind,
        operation: &'static str,
        error: tokio_postgres::Error,
    ) -> EngineError {
        if let Some(db) = error.as_db_error() {
            if db.code() == &SqlState::UNIQUE_VIOLATION {
                return EngineError::conflict(entity, format!("{} Already Exists", entity));
            }
            if db.code() == &SqlState::FOREIGN_KEY_VIOLATION {
                return EngineError::not_found(
                    entity,
                    format!("Referenced entity not found: {}", db.message()),
                );
            }
        }
        StoreError::operation_failed(entity, operation, error.to_string()).into()
    }

    fn decode_row(entity: EntityKind, json: Value) -> EngineResult<Record> {
        match json {
            Value::Object(row) => Ok(row),
            other => Err(StoreError::operation_failed(
                entity,
                "decode",
                format!("expected a JSON object row, got {}", other),
            )
            .into()),
        }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create(&self, entity: EntityKind, record: &Record) -> EngineResult<RecordId> {
        let stmt = sql::insert(self.descriptor(entity), record);
        let conn = self.conn().await?;
        let row = conn
            .query_one(&stmt.sql, &params(&stmt.params))
            .await
            .map_err(|e| Self::map_error(entity, "create", e))?;
        let id: RecordId = row.get(0);
        debug!(table = entity.table(), id, "row inserted");
        Ok(id)
    }

    async fn fetch_page(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        filters: &[Filter],
        page: PageSpec,
    ) -> EngineResult<Vec<Record>> {
        let stmt = sql::select_page(self.descriptor(entity), tenant_id, filters, page);
        let conn = self.conn().await?;
        let rows = conn
            .query(&stmt.sql, &params(&stmt.params))
            .await
            .map_err(|e| Self::map_error(entity, "fetch_page", e))?;
        rows.into_iter()
            .map(|row| Self::decode_row(entity, row.get(0)))
            .collect()
    }

    async fn fetch_one(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        id: RecordId,
    ) -> EngineResult<Option<Record>> {
        let stmt = sql::select_one(self.descriptor(entity), tenant_id, id);
        let conn = self.conn().await?;
        let row = conn
            .query_opt(&stmt.sql, &params(&stmt.params))
            .await
            .map_err(|e| Self::map_error(entity, "fetch_one", e))?;
        row.map(|r| Self::decode_row(entity, r.get(0))).transpose()
    }

    async fn update(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        id: RecordId,
        changes: &Record,
    ) -> EngineResult<u64> {
        // No settable column in the changes means nothing to do; report
        // zero affected rows rather than issuing an empty SET list.
        let Some(stmt) = sql::update(self.descriptor(entity), tenant_id, id, changes) else {
            return Ok(0);
        };
        let conn = self.conn().await?;
        conn.execute(&stmt.sql, &params(&stmt.params))
            .await
            .map_err(|e| Self::map_error(entity, "update", e))
    }

    async fn delete(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        id: RecordId,
    ) -> EngineResult<u64> {
        let stmt = sql::delete(self.descriptor(entity), tenant_id, id);
        let conn = self.conn().await?;
        conn.execute(&stmt.sql, &params(&stmt.params))
            .await
            .map_err(|e| Self::map_error(entity, "delete", e))
    }

    async fn count_where(
        &self,
        entity: EntityKind,
        tenant_id: Option<TenantId>,
        filters: &[Filter],
        exclude: Option<&Filter>,
    ) -> EngineResult<u64> {
        let stmt = sql::count(self.descriptor(entity), tenant_id, filters, exclude);
        let conn = self.conn().await?;
        let row = conn
            .query_one(&stmt.sql, &params(&stmt.params))
            .await
            .map_err(|e| Self::map_error(entity, "count_where", e))?;
        let count: i64 = row.get(0);
        Ok(count as u64)
    }
}

/// View the text parameters as the dyn ToSql slice tokio-postgres expects.
fn params(values: &[Option<String>]) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
    values
        .iter()
        .map(|v| v as &(dyn tokio_postgres::types::ToSql + Sync))
        .collect()
}
