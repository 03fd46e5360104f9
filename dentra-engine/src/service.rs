//! Generic per-entity orchestration.
//!
//! Every entity's service is the same fixed sequence: validate the candidate
//! record, confirm referenced entities exist under the caller's tenant,
//! pre-check uniqueness, perform the store operation, invalidate the
//! entity's cache prefix, and return the id or affected-row count. This
//! module implements that sequence once, generically over the entity
//! descriptor; the sixty-odd per-entity controllers of a full deployment
//! are thin wrappers around it.
//!
//! Validation and existence checks always precede the mutation, so no error
//! path can leave a partial write behind. Update and delete confirm the
//! target row exists first and report `NotFound` uniformly rather than
//! inferring absence from an affected-row count after the fact.

use crate::cache::{CacheAside, CacheBackend, CacheKey};
use crate::exists::ReferentialChecker;
use crate::store::{Filter, PageSpec, Record, RecordStore};
use crate::validator::validate;
use dentra_core::{
    descriptor, EngineError, EngineResult, EntityDescriptor, EntityKind, RecordId, StoreError,
    TenantId, ValidationError,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Tenant-scoped CRUD service for one entity.
pub struct EntityService<S: RecordStore, C: CacheBackend> {
    entity: EntityKind,
    descriptor: EntityDescriptor,
    store: Arc<S>,
    checker: ReferentialChecker<S>,
    cache: CacheAside<C>,
}

impl<S: RecordStore, C: CacheBackend> EntityService<S, C> {
    pub fn new(entity: EntityKind, store: Arc<S>, cache: CacheAside<C>) -> Self {
        Self {
            entity,
            descriptor: descriptor(entity),
            store: Arc::clone(&store),
            checker: ReferentialChecker::new(store),
            cache,
        }
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Create a record: validate, check references and uniqueness, insert,
    /// invalidate. Returns the generated id.
    pub async fn create(
        &self,
        tenant_id: Option<TenantId>,
        record: &Record,
    ) -> EngineResult<RecordId> {
        let tenant_id = self.tenant_scope(tenant_id)?;
        let candidate = self.with_tenant(record, tenant_id);

        validate(&candidate, &self.descriptor.create_schema)?;
        self.check_references(&candidate, tenant_id).await?;
        self.check_unique(&candidate, tenant_id, None).await?;

        let id = self.store.create(self.entity, &candidate).await?;
        self.cache.invalidate_entity(self.entity, tenant_id).await?;
        debug!(entity = %self.entity.table(), id, "created");
        Ok(id)
    }

    /// Fetch a page of records through the cache-aside layer.
    ///
    /// `filters` become both the store predicate and the cache-key
    /// discriminators, so every distinct read has a distinct key under the
    /// entity's invalidation prefix.
    pub async fn list(
        &self,
        tenant_id: Option<TenantId>,
        filters: &[Filter],
        page: i64,
        limit: i64,
    ) -> EngineResult<Value> {
        let tenant_id = self.tenant_scope(tenant_id)?;
        if page < 1 {
            return Err(ValidationError::invalid("page", "must be at least 1").into());
        }
        if limit < 1 {
            return Err(ValidationError::invalid("limit", "must be at least 1").into());
        }

        let mut key = CacheKey::builder(self.entity, tenant_id);
        for filter in filters {
            key = key.discriminator(filter.column, discriminator(&filter.value));
        }
        let key = key.page(page, limit);

        let spec = PageSpec::new(limit, (page - 1) * limit).with_order(self.entity.id_column());
        self.cache
            .get_or_set(&key, None, || async move {
                let rows = self
                    .store
                    .fetch_page(self.entity, tenant_id, filters, spec)
                    .await?;
                Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
            })
            .await
    }

    /// Fetch one record by id through the cache-aside layer. Absence is a
    /// `NotFound` error and is never cached.
    pub async fn get(&self, tenant_id: Option<TenantId>, id: RecordId) -> EngineResult<Record> {
        let tenant_id = self.tenant_scope(tenant_id)?;
        let key = CacheKey::builder(self.entity, tenant_id).record(id);

        let value = self
            .cache
            .get_or_set(&key, None, || async move {
                match self.store.fetch_one(self.entity, tenant_id, id).await? {
                    Some(row) => Ok(Value::Object(row)),
                    None => Err(EngineError::entity_not_found(self.entity, id)),
                }
            })
            .await?;

        match value {
            Value::Object(row) => Ok(row),
            _ => Err(StoreError::operation_failed(
                self.entity,
                "get",
                "cached value is not a record",
            )
            .into()),
        }
    }

    /// Update a record: confirm it exists, validate, check references and
    /// uniqueness (excluding self), mutate, invalidate.
    pub async fn update(
        &self,
        tenant_id: Option<TenantId>,
        id: RecordId,
        changes: &Record,
    ) -> EngineResult<u64> {
        let tenant_id = self.tenant_scope(tenant_id)?;
        let candidate = self.with_tenant(changes, tenant_id);

        validate(&candidate, &self.descriptor.update_schema)?;
        self.require_self_exists(tenant_id, id).await?;
        self.check_references(&candidate, tenant_id).await?;
        self.check_unique(&candidate, tenant_id, Some(id)).await?;

        let affected = self
            .store
            .update(self.entity, tenant_id, id, &candidate)
            .await?;
        if affected == 0 {
            // Row vanished between the existence check and the mutation.
            return Err(EngineError::entity_not_found(self.entity, id));
        }
        self.cache.invalidate_entity(self.entity, tenant_id).await?;
        debug!(entity = %self.entity.table(), id, affected, "updated");
        Ok(affected)
    }

    /// Delete a record: confirm it exists, delete, invalidate.
    pub async fn delete(&self, tenant_id: Option<TenantId>, id: RecordId) -> EngineResult<u64> {
        let tenant_id = self.tenant_scope(tenant_id)?;
        self.require_self_exists(tenant_id, id).await?;

        let affected = self.store.delete(self.entity, tenant_id, id).await?;
        if affected == 0 {
            return Err(EngineError::entity_not_found(self.entity, id));
        }
        self.cache.invalidate_entity(self.entity, tenant_id).await?;
        debug!(entity = %self.entity.table(), id, "deleted");
        Ok(affected)
    }

    // ========================================================================
    // INTERNAL STEPS
    // ========================================================================

    /// Tenant-scoped entities require a tenant id; tenant-global entities
    /// ignore one if supplied.
    fn tenant_scope(&self, tenant_id: Option<TenantId>) -> EngineResult<Option<TenantId>> {
        if self.entity.tenant_scoped() {
            match tenant_id {
                Some(t) => Ok(Some(t)),
                None => Err(ValidationError::required("tenant_id").into()),
            }
        } else {
            Ok(None)
        }
    }

    /// Candidate record with the authoritative tenant id written in. The
    /// caller's path-level tenant always wins over whatever the body said.
    fn with_tenant(&self, record: &Record, tenant_id: Option<TenantId>) -> Record {
        let mut candidate = record.clone();
        if let Some(t) = tenant_id {
            candidate.insert("tenant_id".to_string(), Value::from(t));
        }
        candidate
    }

    async fn require_self_exists(
        &self,
        tenant_id: Option<TenantId>,
        id: RecordId,
    ) -> EngineResult<()> {
        match tenant_id {
            Some(t) => {
                let found = self
                    .checker
                    .exists_in_tenant(self.entity, self.entity.id_column(), &Value::from(id), t)
                    .await?;
                if !found {
                    return Err(EngineError::entity_not_found(self.entity, id));
                }
                Ok(())
            }
            None => {
                self.checker
                    .require_exists(self.entity, self.entity.id_column(), &Value::from(id))
                    .await
            }
        }
    }

    /// Confirm every present reference column resolves, scoped by tenant
    /// except for tenant-global targets. Blank values were either rejected
    /// by validation (non-nullable) or denote an intentionally unset
    /// optional reference.
    async fn check_references(
        &self,
        candidate: &Record,
        tenant_id: Option<TenantId>,
    ) -> EngineResult<()> {
        for rule in &self.descriptor.references {
            let Some(value) = candidate.get(rule.column) else {
                continue;
            };
            if value.is_null() {
                continue;
            }

            if !rule.target.tenant_scoped() {
                self.checker
                    .require_exists(rule.target, rule.target.id_column(), value)
                    .await?;
                continue;
            }

            // A scoped reference without a tenant scope cannot happen: only
            // tenant-scoped entities declare scoped references, and
            // tenant_scope() already required the id.
            let Some(t) = tenant_id else {
                return Err(ValidationError::required("tenant_id").into());
            };
            let found = self
                .checker
                .exists_in_tenant(rule.target, rule.target.id_column(), value, t)
                .await?;
            if !found {
                return Err(EngineError::not_found(
                    rule.target,
                    format!("{} {} not found", rule.target, discriminator(value)),
                ));
            }
        }
        Ok(())
    }

    /// Pre-check uniqueness rules; `exclude_id` makes the check "unique
    /// among siblings other than myself" on update.
    async fn check_unique(
        &self,
        candidate: &Record,
        tenant_id: Option<TenantId>,
        exclude_id: Option<RecordId>,
    ) -> EngineResult<()> {
        for rule in &self.descriptor.unique {
            let Some(value) = candidate.get(rule.column) else {
                continue;
            };
            if value.is_null() || matches!(value, Value::String(s) if s.is_empty()) {
                continue;
            }

            let taken = match exclude_id {
                Some(id) => {
                    self.checker
                        .exists_excluding(
                            self.entity,
                            rule.column,
                            value,
                            self.entity.id_column(),
                            &Value::from(id),
                            tenant_id,
                        )
                        .await?
                }
                None => {
                    let filters = [Filter {
                        column: rule.column,
                        value: value.clone(),
                    }];
                    self.store
                        .count_where(self.entity, tenant_id, &filters, None)
                        .await?
                        > 0
                }
            };
            if taken {
                return Err(EngineError::conflict(
                    self.entity,
                    format!("{} Already Exists", self.entity),
                ));
            }
        }
        Ok(())
    }
}

impl<S: RecordStore, C: CacheBackend> Clone for EntityService<S, C> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity,
            descriptor: self.descriptor.clone(),
            store: Arc::clone(&self.store),
            checker: self.checker.clone(),
            cache: self.cache.clone(),
        }
    }
}

/// Render a JSON value as a cache-key segment or error-message fragment.
fn discriminator(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
