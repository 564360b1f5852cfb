use std::io::Write;

use encoding_rs::Encoding;
use log::{info, warn};

use crate::{
    convert::RowConverter,
    error::RowError,
    io_utils,
    normalize::normalize_record,
    sanitize::sanitize_keys,
    schema::Schema,
    stats::FieldStatistics,
};

pub const DEFAULT_PROGRESS_EVERY: usize = 1000;

#[derive(Debug, Clone)]
pub struct LineWriterOptions {
    pub fix_keys: bool,
    pub progress_every: usize,
}

impl Default for LineWriterOptions {
    fn default() -> Self {
        Self {
            fix_keys: true,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

/// Pushes CSV rows through convert → normalize → sanitize and writes each
/// result as one JSON line.
pub struct LineWriter<'a, W: Write> {
    sink: W,
    converter: &'a RowConverter,
    schema: Option<&'a Schema>,
    stats: &'a mut FieldStatistics,
    options: LineWriterOptions,
    encoding: &'static Encoding,
    rows_seen: usize,
    rows_written: usize,
    rows_skipped: usize,
    line: Vec<u8>,
}

impl<'a, W: Write> LineWriter<'a, W> {
    pub fn new(
        sink: W,
        converter: &'a RowConverter,
        schema: Option<&'a Schema>,
        stats: &'a mut FieldStatistics,
        encoding: &'static Encoding,
        options: LineWriterOptions,
    ) -> Self {
        Self {
            sink,
            converter,
            schema,
            stats,
            options,
            encoding,
            rows_seen: 0,
            rows_written: 0,
            rows_skipped: 0,
            line: Vec::with_capacity(256),
        }
    }

    /// Handles the next result from the CSV reader. Only sink failures are
    /// returned; any other problem with the row is logged and the row skipped.
    pub fn write_result(
        &mut self,
        record: Result<csv::ByteRecord, csv::Error>,
    ) -> Result<(), RowError> {
        self.rows_seen += 1;
        // Header is line 1.
        let fallback = self.rows_seen + 1;
        let outcome = match record {
            Ok(record) => {
                let row = source_line(record.position(), fallback);
                self.write_row(row, &record)
            }
            Err(source) => Err(RowError::Read {
                row: source_line(source.position(), fallback),
                source,
            }),
        };
        match outcome {
            Ok(()) => {
                self.rows_written += 1;
                self.report_progress();
                Ok(())
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!("Skipping {err}");
                self.rows_skipped += 1;
                Ok(())
            }
        }
    }

    fn write_row(&mut self, row: usize, record: &csv::ByteRecord) -> Result<(), RowError> {
        let fields =
            io_utils::decode_record(record, self.encoding).map_err(|err| RowError::Convert {
                row,
                message: err.to_string(),
            })?;
        let converted = self.converter.convert(row, &fields)?;
        let normalized = normalize_record(converted, self.schema, self.stats);
        let sanitized = sanitize_keys(normalized, self.options.fix_keys, self.stats);

        self.line.clear();
        serde_json::to_writer(&mut self.line, &sanitized)
            .map_err(|source| RowError::Serialize { row, source })?;
        self.line.push(b'\n');
        self.sink
            .write_all(&self.line)
            .map_err(|source| RowError::Sink { row, source })
    }

    fn report_progress(&self) {
        let every = self.options.progress_every;
        if every > 0 && self.rows_written.is_multiple_of(every) {
            info!("{} lines processed", self.rows_written);
        }
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }

    /// Returns the sink so the caller can finish it.
    pub fn into_sink(self) -> W {
        self.sink
    }
}

/// Line the record starts on in the input, which differs from the record
/// count once a quoted field spans several lines.
fn source_line(position: Option<&csv::Position>, fallback: usize) -> usize {
    position.map_or(fallback, |pos| pos.line() as usize)
}
