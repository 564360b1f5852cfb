//! CSV row → typed [`Record`] conversion.
//!
//! Column kinds are inferred up front from the whole input (or a sample of it)
//! so every cell in a column is emitted with the same JSON type: a column
//! whose non-null cells all parse as integers becomes integer, then float,
//! otherwise string. Placeholder tokens such as `NA` or `null` become nulls
//! and are later stripped by the normalizer.

use std::{collections::HashMap, io::Read};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, warn};

use crate::{
    error::RowError,
    io_utils,
    value::{Record, Value},
};

const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    String,
}

#[derive(Debug, Clone)]
struct KindCandidate {
    possible_integer: bool,
    possible_float: bool,
    observed: bool,
}

impl KindCandidate {
    fn new() -> Self {
        Self {
            possible_integer: true,
            possible_float: true,
            observed: false,
        }
    }

    fn observe(&mut self, raw: &str) {
        if is_null_token(raw) {
            return;
        }
        self.observed = true;
        if self.possible_integer && raw.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && !parses_finite_float(raw) {
            self.possible_float = false;
        }
    }

    fn decide(&self) -> ColumnKind {
        if !self.observed {
            ColumnKind::String
        } else if self.possible_integer {
            ColumnKind::Integer
        } else if self.possible_float {
            ColumnKind::Float
        } else {
            ColumnKind::String
        }
    }
}

fn parses_finite_float(raw: &str) -> bool {
    raw.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Gives blank headers a positional name and suffixes repeated ones with
/// `.1`, `.2`, … so every column has a distinct key.
pub fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut normalized = Vec::with_capacity(headers.len());
    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header
        };
        let mut candidate = base.clone();
        if let Some(&start) = seen.get(&base) {
            let mut count = start;
            while seen.contains_key(&candidate) {
                count += 1;
                candidate = format!("{base}.{count}");
            }
            seen.insert(base, count);
        }
        seen.insert(candidate.clone(), 0);
        normalized.push(candidate);
    }
    normalized
}

/// Scans up to `sample_rows` data rows (0 = all) and decides each column's kind.
/// Rows that fail to read or decode are ignored here; the conversion pass
/// reports them.
pub fn infer_column_kinds<R>(
    reader: &mut csv::Reader<R>,
    column_count: usize,
    sample_rows: usize,
    encoding: &'static Encoding,
) -> Vec<ColumnKind>
where
    R: Read,
{
    let mut candidates = vec![KindCandidate::new(); column_count];
    let mut record = csv::ByteRecord::new();
    let mut processed = 0usize;
    loop {
        if sample_rows > 0 && processed >= sample_rows {
            break;
        }
        match reader.read_byte_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                debug!("Skipping unreadable row during inference: {err}");
                processed += 1;
                continue;
            }
        }
        processed += 1;
        let Ok(fields) = io_utils::decode_record(&record, encoding) else {
            continue;
        };
        for (candidate, field) in candidates.iter_mut().zip(fields.iter()) {
            candidate.observe(field);
        }
    }
    debug!("Inferred column kinds from {processed} row(s)");
    candidates.iter().map(KindCandidate::decide).collect()
}

pub fn parse_cell(raw: &str, kind: ColumnKind) -> Value {
    if is_null_token(raw) {
        return Value::Null;
    }
    match kind {
        ColumnKind::Integer => match raw.parse::<i64>() {
            Ok(parsed) => Value::Integer(parsed),
            Err(_) => parse_cell(raw, ColumnKind::Float),
        },
        ColumnKind::Float => match raw.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Value::Float(parsed),
            _ => Value::String(raw.to_string()),
        },
        ColumnKind::String => Value::String(raw.to_string()),
    }
}

/// Turns decoded CSV fields into records keyed by the (normalized) headers.
#[derive(Debug, Clone)]
pub struct RowConverter {
    headers: Vec<String>,
    kinds: Vec<ColumnKind>,
}

impl RowConverter {
    pub fn new(headers: Vec<String>, kinds: Vec<ColumnKind>) -> Self {
        debug_assert_eq!(headers.len(), kinds.len());
        Self { headers, kinds }
    }

    /// Reads the header row and infers column kinds from `reader`, which is
    /// consumed by the scan.
    pub fn from_reader<R>(
        reader: &mut csv::Reader<R>,
        sample_rows: usize,
        encoding: &'static Encoding,
    ) -> Result<Self>
    where
        R: Read,
    {
        let headers = io_utils::reader_headers(reader, encoding).context("Reading CSV header row")?;
        let headers = normalize_headers(headers);
        let kinds = infer_column_kinds(reader, headers.len(), sample_rows, encoding);
        for (header, kind) in headers.iter().zip(&kinds) {
            debug!("Column '{header}' inferred as {kind:?}");
        }
        Ok(Self::new(headers, kinds))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    /// Short rows are padded with nulls; rows wider than the header are rejected.
    pub fn convert(&self, row: usize, fields: &[String]) -> Result<Record, RowError> {
        if fields.len() > self.headers.len() {
            return Err(RowError::Convert {
                row,
                message: format!(
                    "expected at most {} field(s) but found {}",
                    self.headers.len(),
                    fields.len()
                ),
            });
        }
        if fields.len() < self.headers.len() {
            warn!(
                "Row {row}: {} of {} field(s) present, padding with nulls",
                fields.len(),
                self.headers.len()
            );
        }
        let mut record = Record::with_capacity(self.headers.len());
        for (idx, (header, kind)) in self.headers.iter().zip(&self.kinds).enumerate() {
            let value = fields
                .get(idx)
                .map_or(Value::Null, |raw| parse_cell(raw, *kind));
            record.push(header.as_str(), value);
        }
        Ok(record)
    }
}
