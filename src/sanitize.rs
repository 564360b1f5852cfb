//! Field-name sanitizing for downstream warehouse ingestion.
//!
//! Dashes and periods are not accepted in column names. A dash becomes `_`
//! and a period becomes `__`, wherever they occur in the key.

use std::{borrow::Cow, collections::HashMap};

use log::warn;

use crate::{stats::FieldStatistics, value::Record};

const ILLEGAL_KEY_CHARS: [char; 2] = ['-', '.'];

pub fn is_illegal_key(key: &str) -> bool {
    key.contains(ILLEGAL_KEY_CHARS)
}

pub fn sanitize_key(key: &str) -> Cow<'_, str> {
    if !is_illegal_key(key) {
        return Cow::Borrowed(key);
    }
    let mut sanitized = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        match ch {
            '-' => sanitized.push('_'),
            '.' => sanitized.push_str("__"),
            other => sanitized.push(other),
        }
    }
    Cow::Owned(sanitized)
}

/// Records every illegal top-level key of `record` in `stats` and, when
/// `fix_keys` is set, returns the record with those keys rewritten in place.
/// A rewritten key that lands on an existing one keeps the first position
/// and the later value.
pub fn sanitize_keys(record: Record, fix_keys: bool, stats: &mut FieldStatistics) -> Record {
    let mut found_illegal = false;
    for key in record.keys() {
        if let Cow::Owned(sanitized) = sanitize_key(key) {
            stats.record_renamed_key(key, &sanitized);
            found_illegal = true;
        }
    }
    if !(found_illegal && fix_keys) {
        return record;
    }

    let mut rebuilt = Record::with_capacity(record.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(record.len());
    for (key, value) in record {
        let sanitized = sanitize_key(&key).into_owned();
        match positions.get(&sanitized) {
            Some(&idx) => {
                warn!("Key '{key}' collides with an existing '{sanitized}'; keeping the later value");
                rebuilt.replace_at(idx, value);
            }
            None => {
                positions.insert(sanitized.clone(), rebuilt.len());
                rebuilt.push(sanitized, value);
            }
        }
    }
    rebuilt
}
