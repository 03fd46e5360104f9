//! Declarative column schemas interpreted by the validator.
//!
//! A [`Schema`] is an ordered sequence of [`ColumnRule`]s for one entity and
//! one operation (create or update). Rules are pure data; the interpreter
//! lives in `dentra-engine`. The kind is a tagged union, so an enum column
//! carries its member list by construction and a non-enum column cannot.

use crate::entity::EntityKind;
use once_cell::sync::Lazy;
use regex::Regex;

/// Column kind, dispatched on by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Numeric coercion of the value must be a mathematical integer.
    Integer,
    /// Numeric coercion of the value must not be NaN.
    Decimal,
    /// String, array, or plain object (arrays/objects serialize to a string
    /// form for JSON-bearing columns). `max_size` applies to strings only.
    Text { max_size: Option<usize> },
    /// Must match `YYYY-MM-DD` exactly. Calendar validity is not checked
    /// here; the record store owns it.
    Date,
    /// Must match `YYYY-MM-DD HH:MM:SS` exactly.
    DateTime,
    /// Must match `HH:MM:SS` exactly.
    Time,
    /// One of the canonical true/false representations: boolean, stringified
    /// boolean, 1/0, "1"/"0".
    Boolean,
    /// Value must be a member of `values`.
    Enum { values: &'static [&'static str] },
}

impl ColumnKind {
    /// Text column with a maximum length (varchar-style).
    pub fn text(max_size: usize) -> Self {
        ColumnKind::Text {
            max_size: Some(max_size),
        }
    }

    /// Text column without a length cap (text/longtext-style).
    pub fn unsized_text() -> Self {
        ColumnKind::Text { max_size: None }
    }
}

/// One immutable, schema-time rule for a single column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    /// Column name, as it appears in candidate records and in the table.
    pub name: &'static str,
    /// Type discriminant for the validator dispatch.
    pub kind: ColumnKind,
    /// Blank values (absent, null, empty string) skip all checks when true.
    pub nullable: bool,
    /// Extra regex constraint applied to string values after the kind check.
    pub pattern: Option<&'static Lazy<Regex>>,
}

/// Ordered column rules for one entity and one operation.
#[derive(Debug, Clone)]
pub struct Schema {
    pub entity: EntityKind,
    pub columns: Vec<ColumnRule>,
}

impl Schema {
    pub fn builder(entity: EntityKind) -> SchemaBuilder {
        SchemaBuilder {
            entity,
            columns: Vec::new(),
        }
    }

    /// Look up a rule by column name.
    pub fn rule(&self, name: &str) -> Option<&ColumnRule> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder {
    entity: EntityKind,
    columns: Vec<ColumnRule>,
}

impl SchemaBuilder {
    /// Add a non-nullable column.
    pub fn required(mut self, name: &'static str, kind: ColumnKind) -> Self {
        self.columns.push(ColumnRule {
            name,
            kind,
            nullable: false,
            pattern: None,
        });
        self
    }

    /// Add a nullable column.
    pub fn nullable(mut self, name: &'static str, kind: ColumnKind) -> Self {
        self.columns.push(ColumnRule {
            name,
            kind,
            nullable: true,
            pattern: None,
        });
        self
    }

    /// Attach a regex pattern to the most recently added column.
    pub fn pattern(mut self, pattern: &'static Lazy<Regex>) -> Self {
        if let Some(last) = self.columns.last_mut() {
            last.pattern = Some(pattern);
        }
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            entity: self.entity,
            columns: self.columns,
        }
    }
}

// ============================================================================
// SHARED PATTERN RULES
// ============================================================================

/// Phone numbers: optional leading +, then 7-15 digits, spaces or dashes.
pub static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,14}$").expect("phone pattern"));

/// Email addresses, intentionally loose: local@domain.tld.
pub static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

/// Domain names: labels of letters/digits/dashes joined by dots.
pub static DOMAIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-]*(\.[A-Za-z0-9][A-Za-z0-9\-]*)+$")
        .expect("domain pattern"));
