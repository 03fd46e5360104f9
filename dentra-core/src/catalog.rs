//! Per-entity descriptor registry.
//!
//! One declarative block per entity: create/update column schemas (identical
//! except for the audit-actor column), foreign-key reference rules, and
//! uniqueness rules. The orchestration layer in `dentra-engine` is generic
//! over these descriptors; nothing else in the workspace knows any entity's
//! columns.

use crate::entity::EntityKind;
use crate::schema::{
    ColumnKind, Schema, DOMAIN_PATTERN, EMAIL_PATTERN, PHONE_PATTERN,
};

/// Foreign-key-style reference from a column to another entity's primary key.
///
/// Tenant scoping of the check is implied by the target: references to the
/// tenant-global [`EntityKind::Tenant`] are looked up without scoping, all
/// others within the caller's tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceRule {
    pub column: &'static str,
    pub target: EntityKind,
}

/// Uniqueness rule: no other row under the same tenant may share the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueRule {
    pub column: &'static str,
}

/// Everything the generic service needs to know about one entity.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub entity: EntityKind,
    pub create_schema: Schema,
    pub update_schema: Schema,
    pub references: Vec<ReferenceRule>,
    pub unique: Vec<UniqueRule>,
}

const STATUS_ACTIVE_INACTIVE: &[&str] = &["ACTIVE", "INACTIVE"];
const GENDERS: &[&str] = &["MALE", "FEMALE", "OTHER"];
const APPOINTMENT_STATUSES: &[&str] = &["SCHEDULED", "CONFIRMED", "COMPLETED", "CANCELLED"];
const PAYMENT_METHODS: &[&str] = &["CASH", "CARD", "INSURANCE", "TRANSFER"];
const PAYMENT_STATUSES: &[&str] = &["PENDING", "PAID", "REFUNDED"];
const REMINDER_CHANNELS: &[&str] = &["SMS", "EMAIL", "PUSH"];

/// Build the descriptor for an entity.
pub fn descriptor(entity: EntityKind) -> EntityDescriptor {
    match entity {
        EntityKind::Tenant => tenant(),
        EntityKind::Clinic => clinic(),
        EntityKind::Dentist => dentist(),
        EntityKind::Patient => patient(),
        EntityKind::Appointment => appointment(),
        EntityKind::Treatment => treatment(),
        EntityKind::Prescription => prescription(),
        EntityKind::Payment => payment(),
        EntityKind::Supplier => supplier(),
        EntityKind::Reminder => reminder(),
        EntityKind::Notification => notification(),
        EntityKind::StatusType => status_type(),
        EntityKind::StatusTypeSub => status_type_sub(),
    }
}

fn tenant() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Tenant)
            .required("tenant_name", ColumnKind::text(100))
            .required("tenant_domain", ColumnKind::text(100))
            .pattern(&DOMAIN_PATTERN)
            .nullable("tenant_address", ColumnKind::text(255))
            .nullable("tenant_phone", ColumnKind::text(20))
            .pattern(&PHONE_PATTERN)
            .nullable("tenant_email", ColumnKind::text(100))
            .pattern(&EMAIL_PATTERN)
            .nullable(
                "tenant_status",
                ColumnKind::Enum {
                    values: STATUS_ACTIVE_INACTIVE,
                },
            )
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Tenant,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![],
        unique: vec![UniqueRule {
            column: "tenant_domain",
        }],
    }
}

fn clinic() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Clinic)
            .required("tenant_id", ColumnKind::Integer)
            .required("clinic_name", ColumnKind::text(100))
            .nullable("clinic_address", ColumnKind::text(255))
            .nullable("clinic_phone", ColumnKind::text(20))
            .pattern(&PHONE_PATTERN)
            .nullable("clinic_email", ColumnKind::text(100))
            .pattern(&EMAIL_PATTERN)
            .nullable("opening_time", ColumnKind::Time)
            .nullable("closing_time", ColumnKind::Time)
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Clinic,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![ReferenceRule {
            column: "tenant_id",
            target: EntityKind::Tenant,
        }],
        unique: vec![UniqueRule {
            column: "clinic_name",
        }],
    }
}

fn dentist() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Dentist)
            .required("tenant_id", ColumnKind::Integer)
            .nullable("clinic_id", ColumnKind::Integer)
            .required("dentist_name", ColumnKind::text(100))
            .required("license_number", ColumnKind::text(50))
            .nullable("specialization", ColumnKind::text(100))
            .nullable("dentist_phone", ColumnKind::text(20))
            .pattern(&PHONE_PATTERN)
            .nullable("dentist_email", ColumnKind::text(100))
            .pattern(&EMAIL_PATTERN)
            .nullable("joined_on", ColumnKind::Date)
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Dentist,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![
            ReferenceRule {
                column: "tenant_id",
                target: EntityKind::Tenant,
            },
            ReferenceRule {
                column: "clinic_id",
                target: EntityKind::Clinic,
            },
        ],
        unique: vec![
            UniqueRule {
                column: "license_number",
            },
            UniqueRule {
                column: "dentist_email",
            },
        ],
    }
}

fn patient() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Patient)
            .required("tenant_id", ColumnKind::Integer)
            .nullable("clinic_id", ColumnKind::Integer)
            .required("patient_name", ColumnKind::text(100))
            .nullable("date_of_birth", ColumnKind::Date)
            .nullable("gender", ColumnKind::Enum { values: GENDERS })
            .required("patient_phone", ColumnKind::text(20))
            .pattern(&PHONE_PATTERN)
            .nullable("patient_email", ColumnKind::text(100))
            .pattern(&EMAIL_PATTERN)
            .nullable("patient_address", ColumnKind::text(255))
            // JSON-bearing column: accepts arrays/objects as well as strings.
            .nullable("medical_history", ColumnKind::unsized_text())
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Patient,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![
            ReferenceRule {
                column: "tenant_id",
                target: EntityKind::Tenant,
            },
            ReferenceRule {
                column: "clinic_id",
                target: EntityKind::Clinic,
            },
        ],
        unique: vec![
            UniqueRule {
                column: "patient_phone",
            },
            UniqueRule {
                column: "patient_email",
            },
        ],
    }
}

fn appointment() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Appointment)
            .required("tenant_id", ColumnKind::Integer)
            .required("clinic_id", ColumnKind::Integer)
            .required("dentist_id", ColumnKind::Integer)
            .required("patient_id", ColumnKind::Integer)
            .required("appointment_date", ColumnKind::Date)
            .required("start_time", ColumnKind::Time)
            .nullable("end_time", ColumnKind::Time)
            .nullable(
                "status",
                ColumnKind::Enum {
                    values: APPOINTMENT_STATUSES,
                },
            )
            .nullable("notes", ColumnKind::unsized_text())
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Appointment,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![
            ReferenceRule {
                column: "tenant_id",
                target: EntityKind::Tenant,
            },
            ReferenceRule {
                column: "clinic_id",
                target: EntityKind::Clinic,
            },
            ReferenceRule {
                column: "dentist_id",
                target: EntityKind::Dentist,
            },
            ReferenceRule {
                column: "patient_id",
                target: EntityKind::Patient,
            },
        ],
        unique: vec![],
    }
}

fn treatment() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Treatment)
            .required("tenant_id", ColumnKind::Integer)
            .required("patient_id", ColumnKind::Integer)
            .required("dentist_id", ColumnKind::Integer)
            .nullable("appointment_id", ColumnKind::Integer)
            .required("treatment_name", ColumnKind::text(150))
            .required("treatment_cost", ColumnKind::Decimal)
            .nullable("treatment_date", ColumnKind::Date)
            .nullable("tooth_number", ColumnKind::Integer)
            .nullable("notes", ColumnKind::unsized_text())
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Treatment,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![
            ReferenceRule {
                column: "tenant_id",
                target: EntityKind::Tenant,
            },
            ReferenceRule {
                column: "patient_id",
                target: EntityKind::Patient,
            },
            ReferenceRule {
                column: "dentist_id",
                target: EntityKind::Dentist,
            },
            ReferenceRule {
                column: "appointment_id",
                target: EntityKind::Appointment,
            },
        ],
        unique: vec![],
    }
}

fn prescription() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Prescription)
            .required("tenant_id", ColumnKind::Integer)
            .required("patient_id", ColumnKind::Integer)
            .required("dentist_id", ColumnKind::Integer)
            .nullable("treatment_id", ColumnKind::Integer)
            .required("prescribed_on", ColumnKind::Date)
            // JSON-bearing column: a list of medication entries.
            .required("medication", ColumnKind::unsized_text())
            .nullable("instructions", ColumnKind::unsized_text())
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Prescription,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![
            ReferenceRule {
                column: "tenant_id",
                target: EntityKind::Tenant,
            },
            ReferenceRule {
                column: "patient_id",
                target: EntityKind::Patient,
            },
            ReferenceRule {
                column: "dentist_id",
                target: EntityKind::Dentist,
            },
            ReferenceRule {
                column: "treatment_id",
                target: EntityKind::Treatment,
            },
        ],
        unique: vec![],
    }
}

fn payment() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Payment)
            .required("tenant_id", ColumnKind::Integer)
            .required("patient_id", ColumnKind::Integer)
            .nullable("treatment_id", ColumnKind::Integer)
            .required("amount", ColumnKind::Decimal)
            .required("payment_date", ColumnKind::DateTime)
            .required(
                "payment_method",
                ColumnKind::Enum {
                    values: PAYMENT_METHODS,
                },
            )
            .nullable("reference_number", ColumnKind::text(50))
            .nullable(
                "status",
                ColumnKind::Enum {
                    values: PAYMENT_STATUSES,
                },
            )
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Payment,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![
            ReferenceRule {
                column: "tenant_id",
                target: EntityKind::Tenant,
            },
            ReferenceRule {
                column: "patient_id",
                target: EntityKind::Patient,
            },
            ReferenceRule {
                column: "treatment_id",
                target: EntityKind::Treatment,
            },
        ],
        unique: vec![UniqueRule {
            column: "reference_number",
        }],
    }
}

fn supplier() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Supplier)
            .required("tenant_id", ColumnKind::Integer)
            .required("supplier_name", ColumnKind::text(100))
            .nullable("contact_person", ColumnKind::text(100))
            .nullable("supplier_phone", ColumnKind::text(20))
            .pattern(&PHONE_PATTERN)
            .nullable("supplier_email", ColumnKind::text(100))
            .pattern(&EMAIL_PATTERN)
            .nullable("supplier_address", ColumnKind::text(255))
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Supplier,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![ReferenceRule {
            column: "tenant_id",
            target: EntityKind::Tenant,
        }],
        unique: vec![UniqueRule {
            column: "supplier_email",
        }],
    }
}

fn reminder() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Reminder)
            .required("tenant_id", ColumnKind::Integer)
            .required("appointment_id", ColumnKind::Integer)
            .required("remind_at", ColumnKind::DateTime)
            .required(
                "channel",
                ColumnKind::Enum {
                    values: REMINDER_CHANNELS,
                },
            )
            .nullable("message", ColumnKind::text(255))
            .nullable("sent", ColumnKind::Boolean)
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Reminder,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![
            ReferenceRule {
                column: "tenant_id",
                target: EntityKind::Tenant,
            },
            ReferenceRule {
                column: "appointment_id",
                target: EntityKind::Appointment,
            },
        ],
        unique: vec![],
    }
}

fn notification() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::Notification)
            .required("tenant_id", ColumnKind::Integer)
            .required("title", ColumnKind::text(150))
            .required("body", ColumnKind::unsized_text())
            .nullable("notify_on", ColumnKind::DateTime)
            .nullable("read", ColumnKind::Boolean)
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::Notification,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![ReferenceRule {
            column: "tenant_id",
            target: EntityKind::Tenant,
        }],
        unique: vec![],
    }
}

fn status_type() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::StatusType)
            .required("tenant_id", ColumnKind::Integer)
            .required("status_type_name", ColumnKind::text(100))
            .nullable("description", ColumnKind::text(255))
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::StatusType,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![ReferenceRule {
            column: "tenant_id",
            target: EntityKind::Tenant,
        }],
        unique: vec![UniqueRule {
            column: "status_type_name",
        }],
    }
}

fn status_type_sub() -> EntityDescriptor {
    let schema = |audit: &'static str| {
        Schema::builder(EntityKind::StatusTypeSub)
            .required("tenant_id", ColumnKind::Integer)
            .required("status_type_id", ColumnKind::Integer)
            .required("status_type_sub_name", ColumnKind::text(100))
            .nullable("description", ColumnKind::text(255))
            .required(audit, ColumnKind::text(50))
            .build()
    };
    EntityDescriptor {
        entity: EntityKind::StatusTypeSub,
        create_schema: schema("created_by"),
        update_schema: schema("updated_by"),
        references: vec![
            ReferenceRule {
                column: "tenant_id",
                target: EntityKind::Tenant,
            },
            ReferenceRule {
                column: "status_type_id",
                target: EntityKind::StatusType,
            },
        ],
        unique: vec![],
    }
}
