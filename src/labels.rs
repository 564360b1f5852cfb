//! Tally of `event_type` values found in JSON-per-line log files.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use log::{debug, info, warn};
use serde_json::Value as JsonValue;

use crate::{
    cli::LabelArgs,
    table::{self, Align},
};

pub const DEFAULT_LOG_PATTERN: &str = "*/unknown*.log";

const LABEL_KEY: &str = "event_type";

#[derive(Debug, Default)]
pub struct LabelCounter {
    counts: HashMap<String, usize>,
}

impl LabelCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every non-blank line of `reader`. `source` names the input in
    /// error messages.
    pub fn ingest_reader<R: BufRead>(&mut self, reader: R, source: &str) -> Result<usize> {
        let mut lines = 0;
        for (idx, line) in reader.lines().enumerate() {
            let line_number = idx + 1;
            let line =
                line.with_context(|| format!("Reading {source} at line {line_number}"))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let label = extract_label(trimmed)
                .with_context(|| format!("Parsing {source} at line {line_number}"))?;
            *self.counts.entry(label).or_insert(0) += 1;
            lines += 1;
        }
        Ok(lines)
    }

    pub fn ingest_file(&mut self, path: &Path) -> Result<usize> {
        let file = File::open(path).with_context(|| format!("Opening log file {path:?}"))?;
        let lines = self.ingest_reader(BufReader::new(file), &path.display().to_string())?;
        debug!("Counted {lines} event(s) in {path:?}");
        Ok(lines)
    }

    pub fn get(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Labels ordered by ascending count, ties broken by name.
    pub fn sorted(&self) -> Vec<(String, usize)> {
        self.counts
            .iter()
            .map(|(label, count)| (label.clone(), *count))
            .sorted_by(|(a_label, a_count), (b_label, b_count)| {
                a_count.cmp(b_count).then_with(|| a_label.cmp(b_label))
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let rows = self
            .sorted()
            .into_iter()
            .map(|(label, count)| vec![label, count.to_string()])
            .collect::<Vec<_>>();
        table::render_table(&[LABEL_KEY, "count"], &[Align::Left, Align::Right], &rows)
    }
}

fn extract_label(line: &str) -> Result<String> {
    let value: JsonValue = serde_json::from_str(line).context("Line is not valid JSON")?;
    match value.get(LABEL_KEY) {
        Some(JsonValue::String(label)) => Ok(label.clone()),
        Some(other) => Err(anyhow!("'{LABEL_KEY}' must be a string, found {other}")),
        None => Err(anyhow!("Line has no '{LABEL_KEY}' entry")),
    }
}

/// Expands `pattern` into the matching file paths, sorted.
pub fn discover_logs(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .with_context(|| format!("Invalid log file pattern '{pattern}'"))?
        .map(|entry| entry.with_context(|| format!("Expanding pattern '{pattern}'")))
        .collect::<Result<Vec<_>>>()?;
    Ok(paths.into_iter().filter(|p| p.is_file()).sorted().collect())
}

pub fn execute(args: &LabelArgs) -> Result<()> {
    let paths = if args.paths.is_empty() {
        discover_logs(&args.pattern)?
    } else {
        args.paths.clone()
    };
    if paths.is_empty() {
        warn!("No log files matched '{}'", args.pattern);
    }

    let mut counter = LabelCounter::new();
    for path in &paths {
        counter.ingest_file(path)?;
    }
    info!(
        "Counted {} distinct event type(s) across {} file(s)",
        counter.counts.len(),
        paths.len()
    );
    print!("{}", counter.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io::Cursor};

    #[test]
    fn sorts_by_count_then_name() {
        let mut counter = LabelCounter::new();
        let input = concat!(
            "{\"event_type\":\"login\"}\n",
            "{\"event_type\":\"logout\"}\n",
            "\n",
            "{\"event_type\":\"login\",\"user\":3}\n",
        );
        let lines = counter.ingest_reader(Cursor::new(input), "memory").unwrap();
        assert_eq!(lines, 3);
        assert_eq!(
            counter.sorted(),
            vec![("logout".to_string(), 1), ("login".to_string(), 2)]
        );
    }

    #[test]
    fn ties_break_alphabetically() {
        let mut counter = LabelCounter::new();
        let input = "{\"event_type\":\"b\"}\n{\"event_type\":\"a\"}\n";
        counter.ingest_reader(Cursor::new(input), "memory").unwrap();
        let labels = counter
            .sorted()
            .into_iter()
            .map(|(label, _)| label)
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["a", "b"]);
    }

    #[test]
    fn malformed_line_names_source_and_line() {
        let mut counter = LabelCounter::new();
        let input = "{\"event_type\":\"ok\"}\nnot json\n";
        let err = counter
            .ingest_reader(Cursor::new(input), "a/unknown.log")
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("a/unknown.log at line 2"), "{message}");
    }

    #[test]
    fn non_string_label_is_rejected() {
        let mut counter = LabelCounter::new();
        let err = counter
            .ingest_reader(Cursor::new("{\"event_type\":5}\n"), "memory")
            .unwrap_err();
        assert!(format!("{err:#}").contains("must be a string"));
        let err = counter
            .ingest_reader(Cursor::new("{\"kind\":\"x\"}\n"), "memory")
            .unwrap_err();
        assert!(format!("{err:#}").contains("no 'event_type'"));
    }

    #[test]
    fn files_accumulate_once_each() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("unknown1.log");
        let second = dir.path().join("unknown2.log");
        fs::write(&first, "{\"event_type\":\"login\"}\n").unwrap();
        fs::write(&second, "{\"event_type\":\"login\"}\n").unwrap();

        let pattern = dir.path().join("unknown*.log");
        let paths = discover_logs(pattern.to_str().unwrap()).unwrap();
        assert_eq!(paths, vec![first, second]);

        let mut counter = LabelCounter::new();
        for path in &paths {
            counter.ingest_file(path).unwrap();
        }
        assert_eq!(counter.get("login"), 2);
    }

    #[test]
    fn empty_counter_renders_header_only() {
        let rendered = LabelCounter::new().render();
        assert_eq!(rendered.lines().count(), 2);
    }
}
