//! End-of-run aggregation and the human-readable conversion report.
//!
//! Everything here reads a finished [`FieldStatistics`]; nothing mutates it.
//! Percentages use the convention that an empty denominator yields `0.0`.

use std::{fmt::Write as _, path::PathBuf};

use itertools::Itertools;

use crate::{
    schema::Schema,
    stats::FieldStatistics,
    table::{self, Align},
};

const BANNER: &str = "--------------------------------";

/// `numerator / denominator` as a percentage, or `0.0` when the denominator is 0.
pub fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    pub name: String,
    pub populated: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub coerced: usize,
    pub not_coerced: usize,
    pub pct_correct: f64,
    pub pct_incorrect: f64,
    pub pct_corrected: f64,
    pub pct_not_corrected: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverallSummary {
    pub populated: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub corrected: usize,
    pub not_corrected: usize,
    pub bad: usize,
    pub pct_correct: f64,
    pub pct_incorrect: f64,
    pub pct_incorrect_fixed: f64,
    pub pct_incorrect_not_fixed: f64,
    pub pct_bad_unknown: f64,
}

/// Per-field schema-check figures plus their totals.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaCheckSummary {
    /// Populated fields, most populated first.
    pub fields: Vec<FieldSummary>,
    pub overall: OverallSummary,
}

impl SchemaCheckSummary {
    pub fn from_statistics(stats: &FieldStatistics) -> Self {
        let fields = stats
            .fields()
            .filter(|(_, counters)| counters.populated > 0)
            .sorted_by(|(a_name, a), (b_name, b)| {
                b.populated.cmp(&a.populated).then_with(|| a_name.cmp(b_name))
            })
            .map(|(name, c)| FieldSummary {
                name: name.to_string(),
                populated: c.populated,
                correct: c.correct,
                incorrect: c.incorrect,
                coerced: c.coerced,
                not_coerced: c.not_coerced,
                pct_correct: percentage(c.correct, c.populated),
                pct_incorrect: percentage(c.incorrect, c.populated),
                pct_corrected: percentage(c.coerced, c.incorrect),
                pct_not_corrected: percentage(c.not_coerced, c.incorrect),
            })
            .collect::<Vec<_>>();

        let mut overall = OverallSummary::default();
        for field in &fields {
            overall.populated += field.populated;
            overall.correct += field.correct;
            overall.incorrect += field.incorrect;
            overall.corrected += field.coerced;
            overall.not_corrected += field.not_coerced;
        }
        overall.bad = stats.bad_key_count();
        overall.pct_correct = percentage(overall.correct, overall.populated);
        overall.pct_incorrect = percentage(overall.incorrect, overall.populated);
        overall.pct_incorrect_fixed = percentage(overall.corrected, overall.incorrect);
        overall.pct_incorrect_not_fixed = percentage(overall.not_corrected, overall.incorrect);
        overall.pct_bad_unknown = percentage(overall.bad, overall.populated);

        Self { fields, overall }
    }

    /// Fields ordered by descending share of incorrect values; ties keep the
    /// populated ranking.
    pub fn ranked_by_incorrect(&self) -> Vec<&FieldSummary> {
        let mut ranked = self.fields.iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.pct_incorrect.total_cmp(&a.pct_incorrect));
        ranked
    }
}

/// Facts about the pass itself, printed in the closing summary.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PathBuf,
    pub rows_written: usize,
    pub rows_skipped: usize,
    pub columns: usize,
    pub fix_keys: bool,
}

pub struct ConversionReport<'a> {
    pub schema: Option<&'a Schema>,
    pub stats: &'a FieldStatistics,
    pub run: RunSummary,
}

impl ConversionReport<'_> {
    pub fn render(&self) -> String {
        let summary = SchemaCheckSummary::from_statistics(self.stats);
        let mut out = String::new();
        if let Some(schema) = self.schema {
            section(&mut out, "SCHEMA SPECIFIED");
            let _ = writeln!(out, "{}", schema.to_pretty_json());
        }
        self.render_missing(&mut out);
        self.render_populated(&mut out);
        self.render_schema_check(&mut out, &summary);
        self.render_keys(&mut out);
        self.render_overall(&mut out, &summary.overall);
        out
    }

    fn render_missing(&self, out: &mut String) {
        section(out, "MISSING FIELDS SUMMARY");
        for (name, counters) in self
            .stats
            .fields()
            .filter(|(_, c)| c.missing > 0)
            .sorted_by(|(a_name, a), (b_name, b)| {
                b.missing.cmp(&a.missing).then_with(|| a_name.cmp(b_name))
            })
        {
            let _ = writeln!(out, "Field name: {name}, None/Null count: {}", counters.missing);
        }
    }

    fn render_populated(&self, out: &mut String) {
        section(out, "VALUE FIELDS SUMMARY");
        for (name, counters) in self
            .stats
            .fields()
            .filter(|(_, c)| c.populated > 0)
            .sorted_by(|(a_name, a), (b_name, b)| {
                b.populated.cmp(&a.populated).then_with(|| a_name.cmp(b_name))
            })
        {
            let _ = writeln!(out, "Field name: {name}, Value count: {}", counters.populated);
        }
    }

    fn render_schema_check(&self, out: &mut String, summary: &SchemaCheckSummary) {
        section(out, "SCHEMA CHECK SUMMARY");
        let rows = summary
            .ranked_by_incorrect()
            .into_iter()
            .map(|f| {
                vec![
                    f.name.clone(),
                    f.correct.to_string(),
                    f.incorrect.to_string(),
                    f.coerced.to_string(),
                    f.not_coerced.to_string(),
                    format!("{:.2}%", f.pct_incorrect),
                    format!("{:.2}%", f.pct_corrected),
                ]
            })
            .collect::<Vec<_>>();
        if rows.is_empty() {
            return;
        }
        let headers = [
            "field",
            "correct",
            "incorrect",
            "fixed",
            "not_fixed",
            "pct_incorrect",
            "pct_corrected",
        ];
        let mut aligns = vec![Align::Right; headers.len()];
        aligns[0] = Align::Left;
        out.push_str(&table::render_table(&headers, &aligns, &rows));
    }

    fn render_keys(&self, out: &mut String) {
        for (field, count) in self.stats.unknown_keys() {
            let _ = writeln!(
                out,
                "Unknown field name: {field}, {count} value(s) not declared in schema"
            );
        }
        let verb = if self.run.fix_keys {
            "replaced with"
        } else {
            "should be replaced with"
        };
        for (original, sanitized) in self.stats.renamed_keys() {
            let _ = writeln!(
                out,
                "Illegal field name: {original} {verb} {sanitized} ({} occurrence(s))",
                self.stats.fixed_key_count(sanitized)
            );
        }
    }

    fn render_overall(&self, out: &mut String, overall: &OverallSummary) {
        section(out, "SUMMARY");
        let run = &self.run;
        let _ = writeln!(
            out,
            "Finished writing JSON file {} with {} rows and {} fields max",
            run.output.display(),
            run.rows_written,
            run.columns
        );
        if run.rows_skipped > 0 {
            let _ = writeln!(out, "Rows skipped = {}", run.rows_skipped);
        }
        let _ = writeln!(out, "Total Populated Fields = {}", overall.populated);
        let _ = writeln!(out, "Total Populated Fields Correct = {}", overall.correct);
        let _ = writeln!(out, "Total Populated Fields Incorrect = {}", overall.incorrect);
        let _ = writeln!(out, "Total Populated Fields Corrected = {}", overall.corrected);
        let _ = writeln!(
            out,
            "Total Populated Fields Not Corrected = {}",
            overall.not_corrected
        );
        let _ = writeln!(out, "Total Populated Bad/Unknown Fields = {}", overall.bad);
        let _ = writeln!(out, "Pct Correct = {:.2}%", overall.pct_correct);
        let _ = writeln!(out, "Pct Incorrect = {:.2}%", overall.pct_incorrect);
        let _ = writeln!(out, "Pct Incorrect Fixed = {:.2}%", overall.pct_incorrect_fixed);
        let _ = writeln!(
            out,
            "Pct Incorrect Not Fixed = {:.2}%",
            overall.pct_incorrect_not_fixed
        );
        let _ = writeln!(out, "Pct Bad/Unknown Fields = {:.2}%", overall.pct_bad_unknown);
    }
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{BANNER}\n{title}\n{BANNER}");
}
