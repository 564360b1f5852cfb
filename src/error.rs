//! Typed errors for the conversion pipeline.
//!
//! Setup failures ([`InputError`], [`SchemaParseError`]) abort a run before the
//! first row. [`RowError`] is reported per row and, apart from sink failures,
//! only causes that row to be skipped. [`CoercionError`] never leaves the
//! normalizer: it is tallied as a "not coerced" field.

use std::path::PathBuf;

use thiserror::Error;

use crate::{schema::SchemaType, value::ValueKind};

/// Problems with the converter's input file detected before reading rows.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file {0:?} does not exist")]
    Missing(PathBuf),

    #[error("file type of {0:?} not supported (expected .csv or .csv.gz)")]
    UnsupportedExtension(PathBuf),
}

/// Failure to turn a schema document into a [`crate::schema::Schema`].
#[derive(Debug, Error)]
pub enum SchemaParseError {
    #[error("failed to read schema file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema section '{0}' not found in document")]
    MissingSection(String),

    #[error("schema {0} must be an array of field descriptors")]
    NotAnArray(String),

    #[error("field descriptor #{index} is not an object")]
    NotAnObject { index: usize },

    #[error("field descriptor #{index} has no string '{key}' entry")]
    MissingKey { index: usize, key: &'static str },

    #[error("field '{field}' declares unknown type '{tag}'")]
    UnknownType { field: String, tag: String },

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),
}

/// Why a value could not be brought to its declared type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("no conversion from {from} to {to}")]
    Unsupported { from: ValueKind, to: SchemaType },

    #[error("'{raw}' is not a valid number for {to}")]
    InvalidNumber { raw: String, to: SchemaType },

    #[error("{raw} is out of range for {to}")]
    OutOfRange { raw: String, to: SchemaType },
}

/// Failure while pushing one row through the line writer.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("row {row}: failed to read record: {source}")]
    Read {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: {message}")]
    Convert { row: usize, message: String },

    #[error("row {row}: failed to serialize record: {source}")]
    Serialize {
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("row {row}: failed to write output: {source}")]
    Sink {
        row: usize,
        #[source]
        source: std::io::Error,
    },
}

impl RowError {
    /// Sink failures end the run; anything else only costs the current row.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RowError::Sink { .. })
    }
}
