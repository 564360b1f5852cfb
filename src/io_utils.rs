//! File plumbing for the converter and the label counter.
//!
//! - **Input detection**: `.csv` and `.csv.gz` inputs, gzip detected by suffix.
//! - **Decoding**: CSV byte records decoded via `encoding_rs`, UTF-8 by default.
//! - **Reader construction**: headers on, flexible row lengths so short rows
//!   can be padded with nulls downstream.
//! - **Line sinks**: buffered plain or gzip output that must be finished to
//!   flush the compressed trailer.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use flate2::{Compression, read::MultiGzDecoder, write::GzEncoder};

use crate::error::InputError;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

const CSV_EXT: &str = ".csv";
const GZIP_CSV_EXT: &str = ".csv.gz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    GzipCsv,
}

/// Classifies `path` by suffix, case-insensitively.
pub fn detect_input_format(path: &Path) -> Result<InputFormat, InputError> {
    let lowered = path.to_string_lossy().to_ascii_lowercase();
    if lowered.ends_with(GZIP_CSV_EXT) {
        Ok(InputFormat::GzipCsv)
    } else if lowered.ends_with(CSV_EXT) {
        Ok(InputFormat::Csv)
    } else {
        Err(InputError::UnsupportedExtension(path.to_path_buf()))
    }
}

/// Setup check run before any row is read: the input must exist and carry a
/// supported extension.
pub fn check_input(path: &Path) -> Result<InputFormat, InputError> {
    if !path.exists() {
        return Err(InputError::Missing(path.to_path_buf()));
    }
    detect_input_format(path)
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_input(path: &Path, format: InputFormat) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let reader: Box<dyn Read> = match format {
        InputFormat::Csv => Box::new(BufReader::new(file)),
        InputFormat::GzipCsv => Box::new(BufReader::new(MultiGzDecoder::new(BufReader::new(file)))),
    };
    Ok(reader)
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    format: InputFormat,
    delimiter: u8,
) -> Result<csv::Reader<Box<dyn Read>>> {
    Ok(open_csv_reader(open_input(path, format)?, delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

/// Destination for newline-delimited JSON.
pub enum LineSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl LineSink {
    pub fn create(path: &Path, gzip: bool) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
        let buffered = BufWriter::new(file);
        Ok(if gzip {
            LineSink::Gzip(GzEncoder::new(buffered, Compression::default()))
        } else {
            LineSink::Plain(buffered)
        })
    }

    /// Flushes buffered output and, for gzip, writes the stream trailer.
    pub fn finish(self) -> io::Result<()> {
        match self {
            LineSink::Plain(mut writer) => writer.flush(),
            LineSink::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for LineSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LineSink::Plain(writer) => writer.write(buf),
            LineSink::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LineSink::Plain(writer) => writer.flush(),
            LineSink::Gzip(encoder) => encoder.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::path::PathBuf;

    #[test]
    fn detects_supported_extensions() {
        assert_eq!(
            detect_input_format(Path::new("data/orders.csv")).unwrap(),
            InputFormat::Csv
        );
        assert_eq!(
            detect_input_format(Path::new("ORDERS.CSV.GZ")).unwrap(),
            InputFormat::GzipCsv
        );
        assert!(matches!(
            detect_input_format(Path::new("orders.tsv")),
            Err(InputError::UnsupportedExtension(_))
        ));
        assert!(matches!(
            detect_input_format(Path::new("orders.gz")),
            Err(InputError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn check_input_reports_missing_file_first() {
        let missing = PathBuf::from("definitely/not/here.txt");
        assert!(matches!(check_input(&missing), Err(InputError::Missing(_))));
    }

    #[test]
    fn gzip_sink_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json.gz");
        let mut sink = LineSink::create(&path, true).unwrap();
        sink.write_all(b"{\"a\":1}\n").unwrap();
        sink.finish().unwrap();

        let mut text = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "{\"a\":1}\n");
    }

    #[test]
    fn resolve_encoding_defaults_to_utf8() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(
            resolve_encoding(Some("latin1")).unwrap().name(),
            "windows-1252"
        );
        assert!(resolve_encoding(Some("klingon")).is_err());
    }
}
