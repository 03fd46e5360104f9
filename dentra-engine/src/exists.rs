//! Referential existence checks.
//!
//! Foreign-key-style integrity without relying on the relational engine's
//! native constraints: before a write is accepted, every referenced row must
//! be confirmed to exist, scoped by the caller's tenant except for
//! tenant-global lookups.
//!
//! A store failure during a check is never reported as "absent": it wraps to
//! a store error so callers can distinguish "definitely absent" from "could
//! not determine".

use crate::store::{Filter, RecordStore};
use dentra_core::{EngineError, EngineResult, EntityKind, TenantId};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Existence checker over a [`RecordStore`].
pub struct ReferentialChecker<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> ReferentialChecker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Tenant-scoped existence: does at least one row of `entity` have
    /// `key_column = key_value` under `tenant_id`?
    ///
    /// Used both for "the entity itself exists" before update/delete and for
    /// referenced-entity checks before create.
    pub async fn exists_in_tenant(
        &self,
        entity: EntityKind,
        key_column: &'static str,
        key_value: &Value,
        tenant_id: TenantId,
    ) -> EngineResult<bool> {
        let filters = [Filter {
            column: key_column,
            value: key_value.clone(),
        }];
        let count = self
            .store
            .count_where(entity, Some(tenant_id), &filters, None)
            .await?;
        debug!(entity = %entity.table(), key_column, tenant_id, found = count > 0, "existence check");
        Ok(count > 0)
    }

    /// Tenant-agnostic existence for global lookup tables. Absence is always
    /// a hard error here, so this raises rather than returning a boolean.
    pub async fn require_exists(
        &self,
        entity: EntityKind,
        key_column: &'static str,
        key_value: &Value,
    ) -> EngineResult<()> {
        let filters = [Filter {
            column: key_column,
            value: key_value.clone(),
        }];
        let count = self.store.count_where(entity, None, &filters, None).await?;
        if count == 0 {
            return Err(EngineError::not_found(
                entity,
                format!("{} {} not found", entity, render(key_value)),
            ));
        }
        Ok(())
    }

    /// Uniqueness-on-update helper: does any row other than the excluded one
    /// share `column = value` under the tenant?
    pub async fn exists_excluding(
        &self,
        entity: EntityKind,
        column: &'static str,
        value: &Value,
        exclude_column: &'static str,
        exclude_value: &Value,
        tenant_id: Option<TenantId>,
    ) -> EngineResult<bool> {
        let filters = [Filter {
            column,
            value: value.clone(),
        }];
        let exclude = Filter {
            column: exclude_column,
            value: exclude_value.clone(),
        };
        let count = self
            .store
            .count_where(entity, tenant_id, &filters, Some(&exclude))
            .await?;
        Ok(count > 0)
    }
}

impl<S: RecordStore> Clone for ReferentialChecker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRecordStore;
    use crate::store::Record;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    async fn seeded() -> (Arc<InMemoryRecordStore>, ReferentialChecker<InMemoryRecordStore>) {
        let store = Arc::new(InMemoryRecordStore::new());
        let checker = ReferentialChecker::new(Arc::clone(&store));

        store
            .create(
                EntityKind::Tenant,
                &record(&[("tenant_name", json!("Acme"))]),
            )
            .await
            .unwrap();
        store
            .create(
                EntityKind::Patient,
                &record(&[("tenant_id", json!(2)), ("patient_name", json!("Ada"))]),
            )
            .await
            .unwrap();
        (store, checker)
    }

    #[tokio::test]
    async fn test_exists_in_tenant_blocks_cross_tenant_reads() {
        let (_store, checker) = seeded().await;

        // Patient 1 belongs to tenant 2; tenant 1 must not see it.
        assert!(checker
            .exists_in_tenant(EntityKind::Patient, "patient_id", &json!(1), 2)
            .await
            .unwrap());
        assert!(!checker
            .exists_in_tenant(EntityKind::Patient, "patient_id", &json!(1), 1)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_require_exists_raises_not_found() {
        let (_store, checker) = seeded().await;

        assert!(checker
            .require_exists(EntityKind::Tenant, "tenant_id", &json!(1))
            .await
            .is_ok());

        let err = checker
            .require_exists(EntityKind::Tenant, "tenant_id", &json!(999))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn test_exists_excluding_ignores_self() {
        let store = Arc::new(InMemoryRecordStore::new());
        let checker = ReferentialChecker::new(Arc::clone(&store));

        for email in ["a@x.com", "b@x.com"] {
            store
                .create(
                    EntityKind::Dentist,
                    &record(&[("tenant_id", json!(1)), ("dentist_email", json!(email))]),
                )
                .await
                .unwrap();
        }

        // Row 1 keeping its own email is not a conflict.
        assert!(!checker
            .exists_excluding(
                EntityKind::Dentist,
                "dentist_email",
                &json!("a@x.com"),
                "dentist_id",
                &json!(1),
                Some(1),
            )
            .await
            .unwrap());

        // Row 1 taking row 2's email is.
        assert!(checker
            .exists_excluding(
                EntityKind::Dentist,
                "dentist_email",
                &json!("b@x.com"),
                "dentist_id",
                &json!(1),
                Some(1),
            )
            .await
            .unwrap());
    }
}
