//! Null stripping and schema reconciliation for one record.

use log::trace;

use crate::{
    coerce::coerce,
    schema::Schema,
    stats::FieldStatistics,
    value::{Record, Value},
};

/// Returns `record` without null fields (at any depth), with schema
/// mismatches coerced where the coercion table allows.
///
/// The same top-level schema is consulted for nested records. Every field is
/// counted exactly once in `stats`: as missing, or as populated plus at most
/// one of correct / incorrect (and then coerced or not coerced).
pub fn normalize_record(
    record: Record,
    schema: Option<&Schema>,
    stats: &mut FieldStatistics,
) -> Record {
    let mut kept = Record::with_capacity(record.len());
    for (key, value) in record {
        match value {
            Value::Null => stats.record_missing(&key),
            Value::Record(nested) => {
                let nested = normalize_record(nested, schema, stats);
                kept.push(key, nested);
            }
            scalar => {
                let scalar = reconcile_field(&key, scalar, schema, stats);
                kept.push(key, scalar);
            }
        }
    }
    kept
}

fn reconcile_field(
    key: &str,
    value: Value,
    schema: Option<&Schema>,
    stats: &mut FieldStatistics,
) -> Value {
    stats.record_populated(key);
    let Some(schema) = schema else {
        return value;
    };
    let Some(declared) = schema.field_type(key) else {
        stats.record_unknown_key(key);
        return value;
    };
    if value.kind() == declared.expected_kind() {
        stats.record_correct(key);
        return value;
    }

    stats.record_incorrect(key);
    match coerce(&value, declared) {
        Ok(coerced) => {
            stats.record_coerced(key);
            coerced
        }
        Err(err) => {
            trace!("Field '{key}' left as-is: {err}");
            stats.record_not_coerced(key);
            value
        }
    }
}
