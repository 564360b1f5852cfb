//! Running per-field counters for a conversion pass.
//!
//! One [`FieldStatistics`] is created per run and threaded by `&mut` through
//! the normalizer and the key sanitizer. Counters only ever grow; once the
//! last row is written the aggregate is handed to [`crate::report`] read-only.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldCounters {
    pub missing: usize,
    pub populated: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub coerced: usize,
    pub not_coerced: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FieldStatistics {
    fields: BTreeMap<String, FieldCounters>,
    unknown_keys: BTreeMap<String, usize>,
    renamed_keys: BTreeMap<String, String>,
    fixed_keys: BTreeMap<String, usize>,
    renamed_occurrences: BTreeMap<String, usize>,
}

impl FieldStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters_mut(&mut self, field: &str) -> &mut FieldCounters {
        self.fields.entry(field.to_string()).or_default()
    }

    pub fn record_missing(&mut self, field: &str) {
        self.counters_mut(field).missing += 1;
    }

    pub fn record_populated(&mut self, field: &str) {
        self.counters_mut(field).populated += 1;
    }

    pub fn record_correct(&mut self, field: &str) {
        self.counters_mut(field).correct += 1;
    }

    pub fn record_incorrect(&mut self, field: &str) {
        self.counters_mut(field).incorrect += 1;
    }

    pub fn record_coerced(&mut self, field: &str) {
        self.counters_mut(field).coerced += 1;
    }

    pub fn record_not_coerced(&mut self, field: &str) {
        self.counters_mut(field).not_coerced += 1;
    }

    /// A populated field whose name the schema does not declare.
    pub fn record_unknown_key(&mut self, field: &str) {
        *self.unknown_keys.entry(field.to_string()).or_insert(0) += 1;
    }

    /// An illegal key seen in a row, and the name it is (or would be) written as.
    pub fn record_renamed_key(&mut self, original: &str, sanitized: &str) {
        self.renamed_keys
            .entry(original.to_string())
            .or_insert_with(|| sanitized.to_string());
        *self.fixed_keys.entry(sanitized.to_string()).or_insert(0) += 1;
        *self
            .renamed_occurrences
            .entry(original.to_string())
            .or_insert(0) += 1;
    }

    pub fn field(&self, name: &str) -> Option<&FieldCounters> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldCounters)> {
        self.fields.iter().map(|(name, counters)| (name.as_str(), counters))
    }

    pub fn missing(&self, name: &str) -> usize {
        self.field(name).map_or(0, |c| c.missing)
    }

    pub fn populated(&self, name: &str) -> usize {
        self.field(name).map_or(0, |c| c.populated)
    }

    pub fn unknown_keys(&self) -> &BTreeMap<String, usize> {
        &self.unknown_keys
    }

    /// Illegal key → sanitized key.
    pub fn renamed_keys(&self) -> &BTreeMap<String, String> {
        &self.renamed_keys
    }

    /// Sanitized key → number of occurrences rewritten to it.
    pub fn fixed_key_count(&self, sanitized: &str) -> usize {
        self.fixed_keys.get(sanitized).copied().unwrap_or(0)
    }

    pub fn fixed_keys(&self) -> &BTreeMap<String, usize> {
        &self.fixed_keys
    }

    pub fn unknown_key_count(&self, field: &str) -> usize {
        self.unknown_keys.get(field).copied().unwrap_or(0)
    }

    /// Occurrences of keys that are unknown to the schema or illegal. A key
    /// that is both counts once per occurrence.
    pub fn bad_key_count(&self) -> usize {
        let unknown = self.unknown_keys.values().sum::<usize>();
        let renamed_only = self
            .renamed_occurrences
            .iter()
            .filter(|(original, _)| !self.unknown_keys.contains_key(original.as_str()))
            .map(|(_, count)| count)
            .sum::<usize>();
        unknown + renamed_only
    }
}
