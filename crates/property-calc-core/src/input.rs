//! Coercion of loosely-typed JSON records into engine inputs.
//!
//! Callers on the other side of the engine boundary (forms, stored scenarios)
//! hand over numbers as either JSON numbers or numeric strings. Everything is
//! normalised to `Decimal` here, before any domain validation runs, and every
//! failure names the offending field.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::RealtyError;
use crate::RealtyResult;

/// Borrow the object behind a scenario record.
pub fn as_record<'a>(value: &'a Value, what: &str) -> RealtyResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| RealtyError::invalid(what, "expected a JSON object"))
}

/// Coerce a single JSON value into a `Decimal`.
///
/// Accepts JSON numbers and strings such as `"250000"`, `" 4.5 "` or
/// `"1e5"`. Empty strings, booleans, arrays and objects are rejected.
pub fn coerce_decimal(value: &Value, field: &str) -> RealtyResult<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string())
            .ok_or_else(|| RealtyError::invalid(field, format!("{n} is not a finite number"))),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(RealtyError::invalid(field, "empty string is not a number"));
            }
            parse_decimal(trimmed)
                .ok_or_else(|| RealtyError::invalid(field, format!("'{s}' is not a finite number")))
        }
        Value::Null => Err(RealtyError::invalid(field, "value is required")),
        other => Err(RealtyError::invalid(
            field,
            format!("expected a number, got {}", type_name(other)),
        )),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A required numeric field. Missing and `null` are both errors.
pub fn require_decimal(record: &Map<String, Value>, field: &str) -> RealtyResult<Decimal> {
    match record.get(field) {
        None => Err(RealtyError::invalid(field, "value is required")),
        Some(v) => coerce_decimal(v, field),
    }
}

/// An optional numeric field. Missing and `null` both mean "use the default".
pub fn optional_decimal(
    record: &Map<String, Value>,
    field: &str,
) -> RealtyResult<Option<Decimal>> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => coerce_decimal(v, field).map(Some),
    }
}

/// A required whole-number field (e.g. unit counts, years).
pub fn require_u32(record: &Map<String, Value>, field: &str) -> RealtyResult<u32> {
    let value = require_decimal(record, field)?;
    decimal_to_u32(value, field)
}

pub fn optional_u32(record: &Map<String, Value>, field: &str) -> RealtyResult<Option<u32>> {
    optional_decimal(record, field)?
        .map(|v| decimal_to_u32(v, field))
        .transpose()
}

fn decimal_to_u32(value: Decimal, field: &str) -> RealtyResult<u32> {
    if !value.fract().is_zero() {
        return Err(RealtyError::invalid(
            field,
            format!("{value} is not an integer"),
        ));
    }
    if value < Decimal::ZERO {
        return Err(RealtyError::invalid(field, "must not be negative"));
    }
    value
        .to_u32()
        .ok_or_else(|| RealtyError::invalid(field, format!("{value} is out of range")))
}

/// Coerce a JSON array of numbers / numeric strings, naming items `field[i]`.
pub fn require_decimal_list(
    record: &Map<String, Value>,
    field: &str,
) -> RealtyResult<Vec<Decimal>> {
    let items = match record.get(field) {
        None | Some(Value::Null) => return Err(RealtyError::invalid(field, "value is required")),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(RealtyError::invalid(
                field,
                format!("expected an array, got {}", type_name(other)),
            ))
        }
    };
    items
        .iter()
        .enumerate()
        .map(|(i, v)| coerce_decimal(v, &format!("{field}[{i}]")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn record(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_numbers_and_strings_coerce() {
        let r = record(json!({
            "a": 250000,
            "b": "4.5",
            "c": " 300000 ",
            "d": 0.75,
            "e": "1e5"
        }));
        assert_eq!(require_decimal(&r, "a").unwrap(), dec!(250000));
        assert_eq!(require_decimal(&r, "b").unwrap(), dec!(4.5));
        assert_eq!(require_decimal(&r, "c").unwrap(), dec!(300000));
        assert_eq!(require_decimal(&r, "d").unwrap(), dec!(0.75));
        assert_eq!(require_decimal(&r, "e").unwrap(), dec!(100000));
    }

    #[test]
    fn test_missing_and_null_required() {
        let r = record(json!({ "a": null }));
        let err = require_decimal(&r, "a").unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        let err = require_decimal(&r, "missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let r = record(json!({ "a": "abc", "b": true, "c": "", "d": [1] }));
        for field in ["a", "b", "c", "d"] {
            let err = require_decimal(&r, field).unwrap_err();
            assert_eq!(err.kind(), "invalid_input", "field {field}");
        }
    }

    #[test]
    fn test_optional_defaults() {
        let r = record(json!({ "a": null, "b": "12" }));
        assert_eq!(optional_decimal(&r, "a").unwrap(), None);
        assert_eq!(optional_decimal(&r, "zzz").unwrap(), None);
        assert_eq!(optional_decimal(&r, "b").unwrap(), Some(dec!(12)));
    }

    #[test]
    fn test_integer_fields() {
        let r = record(json!({ "a": 4, "b": "6", "c": 4.5, "d": -2, "e": 4.0 }));
        assert_eq!(require_u32(&r, "a").unwrap(), 4);
        assert_eq!(require_u32(&r, "b").unwrap(), 6);
        assert!(require_u32(&r, "c").is_err());
        assert!(require_u32(&r, "d").is_err());
        assert_eq!(require_u32(&r, "e").unwrap(), 4);
        assert_eq!(optional_u32(&r, "nope").unwrap(), None);
    }

    #[test]
    fn test_decimal_list_names_item() {
        let r = record(json!({ "flows": [100, "200", "x"] }));
        let err = require_decimal_list(&r, "flows").unwrap_err();
        assert!(err.to_string().contains("flows[2]"));
    }
}
