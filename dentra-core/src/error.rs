//! Error taxonomy for Dentra operations.
//!
//! Four caller-distinguishable classes: malformed input (400), missing
//! entity (404), uniqueness conflict (409), and infrastructure failure
//! (500). The validator and existence checker fail fast; nothing in the
//! engine logs-and-swallows a validation or not-found condition.

use crate::entity::EntityKind;
use thiserror::Error;

/// Input validation errors. Always carry the offending column.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{column} is required")]
    Required { column: String },

    #[error("Invalid value for {column}: {reason}")]
    Invalid { column: String, reason: String },
}

impl ValidationError {
    pub fn required(column: impl Into<String>) -> Self {
        ValidationError::Required {
            column: column.into(),
        }
    }

    pub fn invalid(column: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// The column that failed validation.
    pub fn column(&self) -> &str {
        match self {
            ValidationError::Required { column } | ValidationError::Invalid { column, .. } => column,
        }
    }
}

/// Infrastructure failures from the record store or cache.
///
/// Distinct from "not found": a caller must be able to tell "definitely
/// absent" apart from "could not determine".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Database operation failed on {table} during {operation}: {reason}")]
    OperationFailed {
        table: &'static str,
        operation: &'static str,
        reason: String,
    },

    #[error("Cache operation failed during {operation}: {reason}")]
    CacheFailed {
        operation: &'static str,
        reason: String,
    },

    #[error("Connection pool error: {reason}")]
    PoolFailed { reason: String },
}

impl StoreError {
    pub fn operation_failed(
        entity: EntityKind,
        operation: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        StoreError::OperationFailed {
            table: entity.table(),
            operation,
            reason: reason.into(),
        }
    }

    pub fn cache_failed(operation: &'static str, reason: impl Into<String>) -> Self {
        StoreError::CacheFailed {
            operation,
            reason: reason.into(),
        }
    }

    pub fn pool_failed(reason: impl Into<String>) -> Self {
        StoreError::PoolFailed {
            reason: reason.into(),
        }
    }
}

/// Master error type for all engine operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    NotFound { entity: EntityKind, message: String },

    #[error("{message}")]
    Conflict { entity: EntityKind, message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// A referenced entity, or the entity itself, is absent.
    pub fn not_found(entity: EntityKind, message: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            message: message.into(),
        }
    }

    /// Entity-with-id convenience form of [`EngineError::not_found`].
    pub fn entity_not_found(entity: EntityKind, id: i64) -> Self {
        EngineError::NotFound {
            entity,
            message: format!("{} {} not found", entity, id),
        }
    }

    /// A uniqueness constraint would be violated.
    pub fn conflict(entity: EntityKind, message: impl Into<String>) -> Self {
        EngineError::Conflict {
            entity,
            message: message.into(),
        }
    }

    /// HTTP status hint for the transport layer built atop the engine.
    pub fn http_status(&self) -> u16 {
        match self {
            EngineError::Validation(_) => 400,
            EngineError::NotFound { .. } => 404,
            EngineError::Conflict { .. } => 409,
            EngineError::Store(_) => 500,
        }
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_required() {
        let err = ValidationError::required("tenant_name");
        assert_eq!(format!("{}", err), "tenant_name is required");
        assert_eq!(err.column(), "tenant_name");
    }

    #[test]
    fn test_validation_error_display_invalid() {
        let err = ValidationError::invalid("appointment_date", "expected YYYY-MM-DD");
        let msg = format!("{}", err);
        assert!(msg.contains("appointment_date"));
        assert!(msg.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_store_error_display_carries_context() {
        let err = StoreError::operation_failed(EntityKind::Patient, "fetch_page", "timeout");
        let msg = format!("{}", err);
        assert!(msg.contains("patient"));
        assert!(msg.contains("fetch_page"));
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn test_engine_error_from_variants() {
        let validation = EngineError::from(ValidationError::required("created_by"));
        assert!(matches!(validation, EngineError::Validation(_)));

        let store = EngineError::from(StoreError::cache_failed("get", "backend down"));
        assert!(matches!(store, EngineError::Store(_)));
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            EngineError::from(ValidationError::required("x")).http_status(),
            400
        );
        assert_eq!(
            EngineError::entity_not_found(EntityKind::Dentist, 7).http_status(),
            404
        );
        assert_eq!(
            EngineError::conflict(EntityKind::Tenant, "Tenant Already Exists").http_status(),
            409
        );
        assert_eq!(
            EngineError::from(StoreError::cache_failed("set", "oops")).http_status(),
            500
        );
    }

    #[test]
    fn test_entity_not_found_message() {
        let err = EngineError::entity_not_found(EntityKind::StatusTypeSub, 12);
        assert_eq!(format!("{}", err), "Status type sub 12 not found");
    }
}
