//! Closed catalog of the tables the engine may touch.
//!
//! Table names are never passed around as runtime strings. Every store,
//! existence-check, and cache operation is keyed by [`EntityKind`], so an
//! "unexpected table name" is unrepresentable rather than a runtime check
//! against an allow-list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity discriminator for table dispatch and cache-key namespacing.
///
/// The cache namespace and the SQL table name both derive from the same
/// variant, which keeps key construction and pattern invalidation from
/// drifting apart per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Tenant,
    Clinic,
    Dentist,
    Patient,
    Appointment,
    Treatment,
    Prescription,
    Payment,
    Supplier,
    Reminder,
    Notification,
    StatusType,
    StatusTypeSub,
}

impl EntityKind {
    /// All catalog entries, in declaration order.
    pub const ALL: [EntityKind; 13] = [
        EntityKind::Tenant,
        EntityKind::Clinic,
        EntityKind::Dentist,
        EntityKind::Patient,
        EntityKind::Appointment,
        EntityKind::Treatment,
        EntityKind::Prescription,
        EntityKind::Payment,
        EntityKind::Supplier,
        EntityKind::Reminder,
        EntityKind::Notification,
        EntityKind::StatusType,
        EntityKind::StatusTypeSub,
    ];

    /// SQL table name for this entity.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Tenant => "tenant",
            EntityKind::Clinic => "clinic",
            EntityKind::Dentist => "dentist",
            EntityKind::Patient => "patient",
            EntityKind::Appointment => "appointment",
            EntityKind::Treatment => "treatment",
            EntityKind::Prescription => "prescription",
            EntityKind::Payment => "payment",
            EntityKind::Supplier => "supplier",
            EntityKind::Reminder => "reminder",
            EntityKind::Notification => "notification",
            EntityKind::StatusType => "status_type",
            EntityKind::StatusTypeSub => "status_type_sub",
        }
    }

    /// Primary-key column name for this entity.
    pub fn id_column(self) -> &'static str {
        match self {
            EntityKind::Tenant => "tenant_id",
            EntityKind::Clinic => "clinic_id",
            EntityKind::Dentist => "dentist_id",
            EntityKind::Patient => "patient_id",
            EntityKind::Appointment => "appointment_id",
            EntityKind::Treatment => "treatment_id",
            EntityKind::Prescription => "prescription_id",
            EntityKind::Payment => "payment_id",
            EntityKind::Supplier => "supplier_id",
            EntityKind::Reminder => "reminder_id",
            EntityKind::Notification => "notification_id",
            EntityKind::StatusType => "status_type_id",
            EntityKind::StatusTypeSub => "status_type_sub_id",
        }
    }

    /// Cache-key namespace for this entity.
    ///
    /// Every cache key for the entity starts with this prefix, so deleting
    /// by prefix after a write covers every cached page/limit/discriminator
    /// combination for the entity.
    pub fn namespace(self) -> &'static str {
        match self {
            EntityKind::Tenant => "tenant",
            EntityKind::Clinic => "clinic",
            EntityKind::Dentist => "dentist",
            EntityKind::Patient => "patient",
            EntityKind::Appointment => "appointment",
            EntityKind::Treatment => "treatment",
            EntityKind::Prescription => "prescription",
            EntityKind::Payment => "payment",
            EntityKind::Supplier => "supplier",
            EntityKind::Reminder => "reminder",
            EntityKind::Notification => "notification",
            EntityKind::StatusType => "statusType",
            EntityKind::StatusTypeSub => "statusTypeSub",
        }
    }

    /// Whether rows of this entity carry a `tenant_id` column.
    ///
    /// Only the tenant table itself is tenant-global; existence checks
    /// against it skip tenant scoping.
    pub fn tenant_scoped(self) -> bool {
        !matches!(self, EntityKind::Tenant)
    }

    /// Human-readable name used in error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            EntityKind::Tenant => "Tenant",
            EntityKind::Clinic => "Clinic",
            EntityKind::Dentist => "Dentist",
            EntityKind::Patient => "Patient",
            EntityKind::Appointment => "Appointment",
            EntityKind::Treatment => "Treatment",
            EntityKind::Prescription => "Prescription",
            EntityKind::Payment => "Payment",
            EntityKind::Supplier => "Supplier",
            EntityKind::Reminder => "Reminder",
            EntityKind::Notification => "Notification",
            EntityKind::StatusType => "Status type",
            EntityKind::StatusTypeSub => "Status type sub",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_contains_every_variant_once() {
        let tables: HashSet<&str> = EntityKind::ALL.iter().map(|k| k.table()).collect();
        assert_eq!(tables.len(), EntityKind::ALL.len());
    }

    #[test]
    fn test_namespaces_are_unique() {
        let namespaces: HashSet<&str> = EntityKind::ALL.iter().map(|k| k.namespace()).collect();
        assert_eq!(namespaces.len(), EntityKind::ALL.len());
    }

    #[test]
    fn test_id_columns_end_with_id() {
        for kind in EntityKind::ALL {
            assert!(kind.id_column().ends_with("_id"), "{:?}", kind);
        }
    }

    #[test]
    fn test_only_tenant_is_global() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.tenant_scoped(), kind != EntityKind::Tenant);
        }
    }

    #[test]
    fn test_display_matches_display_name() {
        assert_eq!(EntityKind::StatusTypeSub.to_string(), "Status type sub");
        assert_eq!(EntityKind::Dentist.to_string(), "Dentist");
    }
}
