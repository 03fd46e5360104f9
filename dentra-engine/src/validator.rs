//! Declarative column validation.
//!
//! Interprets a [`Schema`] against a candidate record, column by column in
//! schema order, failing fast on the first violation. Pure function over its
//! inputs: no I/O happens here, so a validation failure can never leave a
//! partial mutation behind.

use crate::store::Record;
use dentra_core::{ColumnKind, ColumnRule, Schema, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static DATE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date format"));
static DATETIME_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("datetime format"));
static TIME_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").expect("time format"));

/// Validate a candidate record against a schema.
///
/// Per column rule, in schema order:
/// 1. Blank value (absent, null, empty string) on a non-nullable column
///    fails with `<col> is required`.
/// 2. Blank value on a nullable column skips every remaining check for the
///    column.
/// 3. Otherwise the value is checked against the column kind, then against
///    the optional pattern.
///
/// The first failing column aborts validation; later columns are never
/// examined. A record that passes satisfies every column's constraints
/// simultaneously.
pub fn validate(record: &Record, schema: &Schema) -> Result<(), ValidationError> {
    for rule in &schema.columns {
        match record.get(rule.name) {
            value if is_blank(value) => {
                if !rule.nullable {
                    return Err(ValidationError::required(rule.name));
                }
            }
            Some(value) => {
                check_kind(rule, value)?;
                check_pattern(rule, value)?;
            }
            // is_blank(None) is true, so the first arm covers absence.
            None => unreachable!("absent values are blank"),
        }
    }
    Ok(())
}

/// Blank means absent, JSON null, or empty string.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn check_kind(rule: &ColumnRule, value: &Value) -> Result<(), ValidationError> {
    match rule.kind {
        ColumnKind::Text { max_size } => check_text(rule.name, value, max_size),
        ColumnKind::Integer => check_integer(rule.name, value),
        ColumnKind::Decimal => check_decimal(rule.name, value),
        ColumnKind::Boolean => check_boolean(rule.name, value),
        ColumnKind::Date => check_format(rule.name, value, &DATE_FORMAT, "YYYY-MM-DD"),
        ColumnKind::DateTime => {
            check_format(rule.name, value, &DATETIME_FORMAT, "YYYY-MM-DD HH:MM:SS")
        }
        ColumnKind::Time => check_format(rule.name, value, &TIME_FORMAT, "HH:MM:SS"),
        ColumnKind::Enum { values } => check_enum(rule.name, value, values),
    }
}

fn check_text(column: &str, value: &Value, max_size: Option<usize>) -> Result<(), ValidationError> {
    match value {
        Value::String(s) => {
            if let Some(max) = max_size {
                let len = s.chars().count();
                if len > max {
                    return Err(ValidationError::invalid(
                        column,
                        format!("length {} exceeds maximum of {}", len, max),
                    ));
                }
            }
            Ok(())
        }
        // Arrays and objects are accepted for JSON-bearing text columns;
        // they serialize to a string form at the store boundary.
        Value::Array(_) | Value::Object(_) => Ok(()),
        _ => Err(ValidationError::invalid(
            column,
            "expected text, array, or object",
        )),
    }
}

fn check_integer(column: &str, value: &Value) -> Result<(), ValidationError> {
    match coerce_number(value) {
        Some(n) if n.fract() == 0.0 => Ok(()),
        Some(_) => Err(ValidationError::invalid(column, "expected an integer")),
        None => Err(ValidationError::invalid(column, "expected a number")),
    }
}

fn check_decimal(column: &str, value: &Value) -> Result<(), ValidationError> {
    match coerce_number(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::invalid(column, "expected a number")),
    }
}

/// Numeric coercion: JSON numbers pass through, strings parse. NaN never
/// coerces (a parsed "NaN" is still not a number for our purposes).
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_nan() {
        None
    } else {
        Some(n)
    }
}

fn check_boolean(column: &str, value: &Value) -> Result<(), ValidationError> {
    let ok = match value {
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_i64(), Some(0) | Some(1)),
        Value::String(s) => {
            let s = s.trim();
            s == "1" || s == "0" || s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ValidationError::invalid(column, "expected a boolean"))
    }
}

fn check_format(
    column: &str,
    value: &Value,
    format: &Regex,
    expected: &str,
) -> Result<(), ValidationError> {
    match value {
        Value::String(s) if format.is_match(s) => Ok(()),
        _ => Err(ValidationError::invalid(
            column,
            format!("expected {}", expected),
        )),
    }
}

fn check_enum(column: &str, value: &Value, values: &[&str]) -> Result<(), ValidationError> {
    match value {
        Value::String(s) if values.contains(&s.as_str()) => Ok(()),
        _ => Err(ValidationError::invalid(
            column,
            format!("expected one of {:?}", values),
        )),
    }
}

fn check_pattern(rule: &ColumnRule, value: &Value) -> Result<(), ValidationError> {
    let Some(pattern) = rule.pattern else {
        return Ok(());
    };
    // Patterns constrain string values only; non-string values for text
    // columns were already accepted or rejected by the kind check.
    if let Value::String(s) = value {
        if !pattern.is_match(s) {
            return Err(ValidationError::invalid(rule.name, "does not match pattern"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentra_core::schema::PHONE_PATTERN;
    use dentra_core::EntityKind;
    use serde_json::{json, Map};

    fn record(pairs: &[(&str, Value)]) -> Record {
        let mut map = Map::new();
        for (k, v) in pairs {
            map.insert((*k).to_string(), v.clone());
        }
        map
    }

    fn two_required() -> Schema {
        Schema::builder(EntityKind::Clinic)
            .required("clinic_name", ColumnKind::text(100))
            .required("created_by", ColumnKind::text(50))
            .build()
    }

    #[test]
    fn test_missing_required_column_fails_fast() {
        // Both columns are violated; the error must name the first one.
        let rec = record(&[("created_by", json!(42))]);
        let err = validate(&rec, &two_required()).unwrap_err();
        assert_eq!(err.column(), "clinic_name");
    }

    #[test]
    fn test_empty_string_counts_as_blank() {
        let rec = record(&[("clinic_name", json!("")), ("created_by", json!("ADMIN"))]);
        let err = validate(&rec, &two_required()).unwrap_err();
        assert_eq!(err, ValidationError::required("clinic_name"));
    }

    #[test]
    fn test_nullable_blank_skips_type_check() {
        // Wrong-typed value in a nullable field must not be type-checked
        // when blank; when present it must be.
        let schema = Schema::builder(EntityKind::Clinic)
            .nullable("opening_time", ColumnKind::Time)
            .build();

        assert!(validate(&record(&[]), &schema).is_ok());
        assert!(validate(&record(&[("opening_time", json!(null))]), &schema).is_ok());
        assert!(validate(&record(&[("opening_time", json!(""))]), &schema).is_ok());
        assert!(validate(&record(&[("opening_time", json!(12))]), &schema).is_err());
    }

    #[test]
    fn test_text_size_boundary() {
        let schema = Schema::builder(EntityKind::Clinic)
            .required("clinic_name", ColumnKind::text(50))
            .build();

        let exactly_50 = "x".repeat(50);
        let over_by_one = "x".repeat(51);
        assert!(validate(&record(&[("clinic_name", json!(exactly_50))]), &schema).is_ok());
        let err = validate(&record(&[("clinic_name", json!(over_by_one))]), &schema).unwrap_err();
        assert_eq!(err.column(), "clinic_name");
    }

    #[test]
    fn test_text_accepts_arrays_and_objects() {
        let schema = Schema::builder(EntityKind::Patient)
            .required("medical_history", ColumnKind::unsized_text())
            .build();

        assert!(validate(
            &record(&[("medical_history", json!(["allergy: penicillin"]))]),
            &schema
        )
        .is_ok());
        assert!(validate(
            &record(&[("medical_history", json!({"allergies": ["penicillin"]}))]),
            &schema
        )
        .is_ok());
        assert!(validate(&record(&[("medical_history", json!(true))]), &schema).is_err());
    }

    #[test]
    fn test_integer_coercion() {
        let schema = Schema::builder(EntityKind::Treatment)
            .required("tooth_number", ColumnKind::Integer)
            .build();

        assert!(validate(&record(&[("tooth_number", json!(18))]), &schema).is_ok());
        assert!(validate(&record(&[("tooth_number", json!("18"))]), &schema).is_ok());
        assert!(validate(&record(&[("tooth_number", json!(18.0))]), &schema).is_ok());
        assert!(validate(&record(&[("tooth_number", json!(18.5))]), &schema).is_err());
        assert!(validate(&record(&[("tooth_number", json!("18.5"))]), &schema).is_err());
        assert!(validate(&record(&[("tooth_number", json!("teeth"))]), &schema).is_err());
    }

    #[test]
    fn test_decimal_coercion() {
        let schema = Schema::builder(EntityKind::Treatment)
            .required("treatment_cost", ColumnKind::Decimal)
            .build();

        assert!(validate(&record(&[("treatment_cost", json!(149.50))]), &schema).is_ok());
        assert!(validate(&record(&[("treatment_cost", json!("149.50"))]), &schema).is_ok());
        assert!(validate(&record(&[("treatment_cost", json!("NaN"))]), &schema).is_err());
        assert!(validate(&record(&[("treatment_cost", json!([1, 2]))]), &schema).is_err());
    }

    #[test]
    fn test_boolean_canonical_forms() {
        let schema = Schema::builder(EntityKind::Reminder)
            .required("sent", ColumnKind::Boolean)
            .build();

        for ok in [
            json!(true),
            json!(false),
            json!(1),
            json!(0),
            json!("1"),
            json!("0"),
            json!("true"),
            json!("False"),
        ] {
            assert!(validate(&record(&[("sent", ok.clone())]), &schema).is_ok(), "{}", ok);
        }
        for bad in [json!(2), json!("yes"), json!(0.5)] {
            assert!(validate(&record(&[("sent", bad.clone())]), &schema).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_date_format_strictness() {
        let schema = Schema::builder(EntityKind::Appointment)
            .required("appointment_date", ColumnKind::Date)
            .build();

        assert!(validate(&record(&[("appointment_date", json!("2024-01-15"))]), &schema).is_ok());
        for bad in ["2024-1-15", "01/15/2024", "2024-01-15T00:00:00"] {
            assert!(
                validate(&record(&[("appointment_date", json!(bad))]), &schema).is_err(),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_date_format_does_not_check_calendar_validity() {
        // Deliberate leniency: the record store owns calendar validity.
        let schema = Schema::builder(EntityKind::Appointment)
            .required("appointment_date", ColumnKind::Date)
            .build();
        assert!(validate(&record(&[("appointment_date", json!("2024-13-45"))]), &schema).is_ok());
    }

    #[test]
    fn test_datetime_and_time_formats() {
        let schema = Schema::builder(EntityKind::Payment)
            .required("payment_date", ColumnKind::DateTime)
            .required("start_time", ColumnKind::Time)
            .build();

        let rec = record(&[
            ("payment_date", json!("2024-01-15 09:30:00")),
            ("start_time", json!("09:30:00")),
        ]);
        assert!(validate(&rec, &schema).is_ok());

        let bad_dt = record(&[
            ("payment_date", json!("2024-01-15T09:30:00")),
            ("start_time", json!("09:30:00")),
        ]);
        assert!(validate(&bad_dt, &schema).is_err());

        let bad_time = record(&[
            ("payment_date", json!("2024-01-15 09:30:00")),
            ("start_time", json!("9:30")),
        ]);
        assert!(validate(&bad_time, &schema).is_err());
    }

    #[test]
    fn test_enum_membership() {
        let schema = Schema::builder(EntityKind::Payment)
            .required("payment_method", ColumnKind::Enum {
                values: &["CASH", "CARD"],
            })
            .build();

        assert!(validate(&record(&[("payment_method", json!("CASH"))]), &schema).is_ok());
        assert!(validate(&record(&[("payment_method", json!("BARTER"))]), &schema).is_err());
        assert!(validate(&record(&[("payment_method", json!(1))]), &schema).is_err());
    }

    #[test]
    fn test_pattern_applies_after_kind_check() {
        let schema = Schema::builder(EntityKind::Clinic)
            .required("clinic_phone", ColumnKind::text(20))
            .pattern(&PHONE_PATTERN)
            .build();

        assert!(validate(&record(&[("clinic_phone", json!("+45 2345 6789"))]), &schema).is_ok());
        let err =
            validate(&record(&[("clinic_phone", json!("front desk"))]), &schema).unwrap_err();
        assert_eq!(err.column(), "clinic_phone");
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use dentra_core::EntityKind;
    use proptest::prelude::*;
    use serde_json::Map;

    fn arbitrary_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::Number(n.into())),
            "[a-zA-Z0-9 ]{0,40}".prop_map(Value::String),
        ]
    }

    proptest! {
        /// Blank values in nullable columns never fail, whatever the kind.
        #[test]
        fn prop_nullable_blank_always_passes(name in "[a-z_]{1,20}") {
            // Leak the generated name to satisfy the 'static rule name;
            // bounded by proptest's case count.
            let name: &'static str = Box::leak(name.into_boxed_str());
            for kind in [
                ColumnKind::Integer,
                ColumnKind::Decimal,
                ColumnKind::Date,
                ColumnKind::Boolean,
                ColumnKind::text(10),
            ] {
                let schema = Schema::builder(EntityKind::Clinic)
                    .nullable(name, kind)
                    .build();
                prop_assert!(validate(&Map::new(), &schema).is_ok());
            }
        }

        /// The reported column is always the first rule violated in schema
        /// order, never a later one.
        #[test]
        fn prop_fail_fast_reports_first_violation(value in arbitrary_value()) {
            let schema = Schema::builder(EntityKind::Clinic)
                .required("first", ColumnKind::Date)
                .required("second", ColumnKind::Date)
                .build();

            let mut rec = Map::new();
            rec.insert("first".to_string(), value);
            // "second" is always missing, but a violation in "first" must
            // shadow it.
            match validate(&rec, &schema) {
                Ok(()) => prop_assert!(false, "second is missing, must not pass"),
                Err(e) => {
                    let first_ok = matches!(
                        rec.get("first"),
                        Some(Value::String(s)) if s.len() == 10
                            && regex::Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap().is_match(s)
                    );
                    if first_ok {
                        prop_assert_eq!(e.column(), "second");
                    } else {
                        prop_assert_eq!(e.column(), "first");
                    }
                }
            }
        }

        /// Integer acceptance agrees with f64 fract on string inputs.
        #[test]
        fn prop_integer_strings(n in -1_000_000i64..1_000_000) {
            let schema = Schema::builder(EntityKind::Clinic)
                .required("n", ColumnKind::Integer)
                .build();
            let mut rec = Map::new();
            rec.insert("n".to_string(), Value::String(n.to_string()));
            prop_assert!(validate(&rec, &schema).is_ok());

            rec.insert("n".to_string(), Value::String(format!("{}.5", n)));
            prop_assert!(validate(&rec, &schema).is_err());
        }
    }
}
