//! Best-effort conversion of a mismatched field to its declared type.
//!
//! Supported conversions:
//!
//! | value   | declared expects | conversion                                   |
//! |---------|------------------|----------------------------------------------|
//! | float   | integer          | truncate toward zero                         |
//! | integer | float            | widen                                        |
//! | string  | integer          | parse as float and truncate, else as integer |
//! | string  | float            | parse as float                               |
//! | float   | string           | shortest round-trip decimal text             |
//!
//! Everything else is [`CoercionError::Unsupported`].

use crate::{
    error::CoercionError,
    schema::SchemaType,
    value::{Value, ValueKind},
};

// 2^63 as f64; the largest float strictly below it is the largest truncatable value.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

pub fn coerce(value: &Value, target: SchemaType) -> Result<Value, CoercionError> {
    match (value, target.expected_kind()) {
        (Value::Float(f), ValueKind::Integer) => float_to_integer(*f, target),
        (Value::Integer(i), ValueKind::Float) => Ok(Value::Float(*i as f64)),
        (Value::String(s), ValueKind::Integer) => string_to_integer(s, target),
        (Value::String(s), ValueKind::Float) => string_to_float(s, target).map(Value::Float),
        (Value::Float(f), ValueKind::String) => Ok(Value::String(format_float(*f))),
        (other, _) => Err(CoercionError::Unsupported {
            from: other.kind(),
            to: target,
        }),
    }
}

fn float_to_integer(value: f64, target: SchemaType) -> Result<Value, CoercionError> {
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated >= I64_BOUND || truncated < -I64_BOUND {
        return Err(CoercionError::OutOfRange {
            raw: format_float(value),
            to: target,
        });
    }
    Ok(Value::Integer(truncated as i64))
}

fn string_to_integer(raw: &str, target: SchemaType) -> Result<Value, CoercionError> {
    let trimmed = raw.trim();
    if let Some(value) = trimmed
        .parse::<f64>()
        .ok()
        .and_then(|parsed| float_to_integer(parsed, target).ok())
    {
        return Ok(value);
    }
    trimmed
        .parse::<i64>()
        .map(Value::Integer)
        .map_err(|_| CoercionError::InvalidNumber {
            raw: raw.to_string(),
            to: target,
        })
}

fn string_to_float(raw: &str, target: SchemaType) -> Result<f64, CoercionError> {
    match raw.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(CoercionError::InvalidNumber {
            raw: raw.to_string(),
            to: target,
        }),
    }
}

/// Renders a float the way it round-trips: `10.0`, `0.1`, `1e21`.
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}
