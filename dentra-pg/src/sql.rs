//! SQL statement construction.
//!
//! Statements are assembled from the closed entity catalog and the
//! descriptor column rules: table names come from [`EntityKind::table`],
//! column names from `&'static str` descriptor code, so no identifier ever
//! derives from request input. The only runtime inputs are parameter
//! values, and those are always bound, never spliced.
//!
//! Parameters travel as text and are narrowed in the statement with a
//! double cast (`$n::text::bigint`), which keeps the wire encoding uniform
//! across column kinds and lets PostgreSQL reject malformed values with a
//! cast error instead of silently coercing.

use dentra_core::{ColumnKind, EntityDescriptor, EntityKind, RecordId, TenantId};
use dentra_engine::{Filter, PageSpec, Record};
use serde_json::Value;
use std::fmt::Write as _;

/// A built statement: SQL text plus positional text parameters.
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<Option<String>>,
}

/// Cast suffix narrowing a text parameter to the column's SQL type.
fn cast(descriptor: &EntityDescriptor, column: &str) -> &'static str {
    if column == descriptor.entity.id_column() {
        return "::text::bigint";
    }
    let kind = descriptor
        .create_schema
        .rule(column)
        .map(|rule| &rule.kind);
    match kind {
        Some(ColumnKind::Integer) => "::text::bigint",
        Some(ColumnKind::Decimal) => "::text::numeric",
        Some(ColumnKind::Boolean) => "::text::boolean",
        Some(ColumnKind::Date) => "::text::date",
        Some(ColumnKind::DateTime) => "::text::timestamptz",
        Some(ColumnKind::Time) => "::text::time",
        Some(ColumnKind::Text { .. }) | Some(ColumnKind::Enum { .. }) | None => "::text",
    }
}

/// Encode a JSON value as a text parameter. Arrays and objects serialize to
/// their compact JSON text (JSON-bearing columns are text columns).
fn encode(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// `INSERT ... RETURNING {id_column}` over the record's schema columns.
///
/// Only columns the schema declares are inserted; anything else in the
/// record is dropped here rather than reaching the database.
pub(crate) fn insert(descriptor: &EntityDescriptor, record: &Record) -> Statement {
    let entity = descriptor.entity;
    let mut columns = Vec::new();
    let mut params = Vec::new();
    for rule in &descriptor.create_schema.columns {
        if let Some(value) = record.get(rule.name) {
            columns.push(rule.name);
            params.push(encode(value));
        }
    }

    let mut sql = format!("INSERT INTO {} (", entity.table());
    sql.push_str(&columns.join(", "));
    sql.push_str(") VALUES (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        let _ = write!(sql, "${}{}", i + 1, cast(descriptor, column));
    }
    let _ = write!(sql, ") RETURNING {}", entity.id_column());

    Statement { sql, params }
}

/// `SELECT to_jsonb(t) ...` page read with filters, ordering, and bounds.
pub(crate) fn select_page(
    descriptor: &EntityDescriptor,
    tenant_id: Option<TenantId>,
    filters: &[Filter],
    page: PageSpec,
) -> Statement {
    let entity = descriptor.entity;
    let mut sql = format!("SELECT to_jsonb(t) FROM {} t", entity.table());
    let mut params = Vec::new();
    push_scope(&mut sql, &mut params, descriptor, tenant_id, filters, None);

    let order = page.order_by.unwrap_or(entity.id_column());
    let _ = write!(sql, " ORDER BY {}", order);
    params.push(Some(page.limit.to_string()));
    let _ = write!(sql, " LIMIT ${}::text::bigint", params.len());
    params.push(Some(page.offset.to_string()));
    let _ = write!(sql, " OFFSET ${}::text::bigint", params.len());

    Statement { sql, params }
}

/// `SELECT to_jsonb(t) ...` single-row read by primary key.
pub(crate) fn select_one(
    descriptor: &EntityDescriptor,
    tenant_id: Option<TenantId>,
    id: RecordId,
) -> Statement {
    let entity = descriptor.entity;
    let mut sql = format!("SELECT to_jsonb(t) FROM {} t", entity.table());
    let mut params = Vec::new();
    let id_filter = [Filter {
        column: entity.id_column(),
        value: Value::from(id),
    }];
    push_scope(&mut sql, &mut params, descriptor, tenant_id, &id_filter, None);
    Statement { sql, params }
}

/// `UPDATE ... WHERE {id} AND {tenant}` over the changed schema columns,
/// or `None` when the changes touch no settable column.
///
/// The primary key and, for scoped entities, `tenant_id` never appear in the
/// SET list: rows cannot be renumbered or moved between tenants.
pub(crate) fn update(
    descriptor: &EntityDescriptor,
    tenant_id: Option<TenantId>,
    id: RecordId,
    changes: &Record,
) -> Option<Statement> {
    let entity = descriptor.entity;
    let mut sql = format!("UPDATE {} SET ", entity.table());
    let mut params = Vec::new();
    let mut first = true;
    for rule in &descriptor.update_schema.columns {
        if rule.name == entity.id_column() {
            continue;
        }
        if entity.tenant_scoped() && rule.name == "tenant_id" {
            continue;
        }
        if let Some(value) = changes.get(rule.name) {
            if !first {
                sql.push_str(", ");
            }
            first = false;
            params.push(encode(value));
            let _ = write!(
                sql,
                "{} = ${}{}",
                rule.name,
                params.len(),
                cast(descriptor, rule.name)
            );
        }
    }
    if first {
        return None;
    }

    params.push(Some(id.to_string()));
    let _ = write!(sql, " WHERE {} = ${}::text::bigint", entity.id_column(), params.len());
    if let Some(t) = tenant_id {
        params.push(Some(t.to_string()));
        let _ = write!(sql, " AND tenant_id = ${}::text::bigint", params.len());
    }

    Some(Statement { sql, params })
}

/// `DELETE ... WHERE {id} AND {tenant}`.
pub(crate) fn delete(
    descriptor: &EntityDescriptor,
    tenant_id: Option<TenantId>,
    id: RecordId,
) -> Statement {
    let entity = descriptor.entity;
    let mut sql = format!("DELETE FROM {}", entity.table());
    let mut params = Vec::new();

    params.push(Some(id.to_string()));
    let _ = write!(sql, " WHERE {} = ${}::text::bigint", entity.id_column(), params.len());
    if let Some(t) = tenant_id {
        params.push(Some(t.to_string()));
        let _ = write!(sql, " AND tenant_id = ${}::text::bigint", params.len());
    }

    Statement { sql, params }
}

/// `SELECT COUNT(*) ...` with filters and an optional exclusion.
pub(crate) fn count(
    descriptor: &EntityDescriptor,
    tenant_id: Option<TenantId>,
    filters: &[Filter],
    exclude: Option<&Filter>,
) -> Statement {
    let mut sql = format!("SELECT COUNT(*) FROM {} t", descriptor.entity.table());
    let mut params = Vec::new();
    push_scope(&mut sql, &mut params, descriptor, tenant_id, filters, exclude);
    Statement { sql, params }
}

/// Append the WHERE clause: tenant scope, equality filters, optional
/// exclusion. `IS DISTINCT FROM` keeps NULL-valued rows in an excluding
/// count, matching "every row other than the excluded one".
fn push_scope(
    sql: &mut String,
    params: &mut Vec<Option<String>>,
    descriptor: &EntityDescriptor,
    tenant_id: Option<TenantId>,
    filters: &[Filter],
    exclude: Option<&Filter>,
) {
    let mut clauses: Vec<String> = Vec::new();

    if let Some(t) = tenant_id {
        if descriptor.entity.tenant_scoped() {
            params.push(Some(t.to_string()));
            clauses.push(format!("tenant_id = ${}::text::bigint", params.len()));
        }
    }
    for filter in filters {
        params.push(encode(&filter.value));
        clauses.push(format!(
            "{} = ${}{}",
            filter.column,
            params.len(),
            cast(descriptor, filter.column)
        ));
    }
    if let Some(ex) = exclude {
        params.push(encode(&ex.value));
        clauses.push(format!(
            "{} IS DISTINCT FROM ${}{}",
            ex.column,
            params.len(),
            cast(descriptor, ex.column)
        ));
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
}
