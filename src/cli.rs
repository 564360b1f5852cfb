use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{labels::DEFAULT_LOG_PATTERN, writer::DEFAULT_PROGRESS_EVERY};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Convert CSV files to newline-delimited JSON and tally unknown log event types",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert a CSV (or gzipped CSV) file into newline-delimited JSON
    Convert(ConvertArgs),
    /// Count `event_type` values across JSON-per-line log files
    Labels(LabelArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input file (.csv or .csv.gz)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination for the JSON lines
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Gzip-compress the output
    #[arg(long)]
    pub gzip: bool,
    /// Schema document listing `{"name": ..., "type": ...}` field descriptors
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Top-level key of the schema document holding the descriptor array
    #[arg(long = "schema-name", requires = "schema")]
    pub schema_name: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of rows to sample when inferring column kinds (0 means full scan)
    #[arg(long, default_value_t = 0)]
    pub sample_rows: usize,
    /// Log a progress line every N rows written (0 disables)
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: usize,
    /// Report keys containing '-' or '.' without rewriting them
    #[arg(long = "keep-illegal-keys")]
    pub keep_illegal_keys: bool,
}

#[derive(Debug, Args)]
pub struct LabelArgs {
    /// Log files to scan; when omitted, files matching --pattern are used
    pub paths: Vec<PathBuf>,
    /// Glob used to discover log files relative to the working directory
    #[arg(long, default_value = DEFAULT_LOG_PATTERN)]
    pub pattern: String,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn delimiter_aliases() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
    }

    #[test]
    fn schema_name_requires_schema() {
        let result = Cli::try_parse_from([
            "csv-ndjson",
            "convert",
            "-i",
            "in.csv",
            "-o",
            "out.json",
            "--schema-name",
            "orders",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn labels_defaults_to_unknown_log_pattern() {
        let cli = Cli::try_parse_from(["csv-ndjson", "labels"]).unwrap();
        match cli.command {
            Commands::Labels(args) => {
                assert!(args.paths.is_empty());
                assert_eq!(args.pattern, "*/unknown*.log");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
