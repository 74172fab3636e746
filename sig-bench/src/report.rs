//! Result reporting
//!
//! Renders the aggregated means to the console, to the text report and to a
//! JSON document. Time means are printed in seconds with 6 decimals, memory
//! means as whole bytes.

use crate::aggregate::AggregateReport;
use crate::error::Result;
use crate::sampler::TrialStats;
use crate::types::{AlgorithmSlot, Metric, Operation, RunConfig, SeriesKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

pub const JSON_REPORT_FILE: &str = "results.json";

const TITLE: &str = "MEASUREMENT RESULTS: ECDSA vs DILITHIUM";

/// Everything a reporter needs to describe one run
#[derive(Debug, Clone)]
pub struct RunSummary<'a> {
    pub run: RunConfig,
    /// Concrete algorithm identifiers, e.g. `ECDSA-secp256k1` and `Dilithium3`
    pub classical_name: &'a str,
    pub post_quantum_name: &'a str,
    pub stats: &'a TrialStats,
    pub report: &'a AggregateReport,
}

fn row_label(algorithm: AlgorithmSlot, operation: Operation) -> String {
    format!("{} {}:", algorithm.label(), operation.label())
}

fn rows() -> impl Iterator<Item = (AlgorithmSlot, Operation)> {
    AlgorithmSlot::ALL
        .into_iter()
        .flat_map(|algorithm| Operation::ALL.into_iter().map(move |op| (algorithm, op)))
}

fn format_value(metric: Metric, mean: f64) -> String {
    match metric {
        Metric::Time => format!("{:.6}", mean),
        Metric::Memory => format!("{:.0}", mean),
    }
}

fn write_section(
    out: &mut String,
    summary: &RunSummary<'_>,
    metric: Metric,
) -> std::fmt::Result {
    for (algorithm, operation) in rows() {
        let key = SeriesKey::new(algorithm, operation, metric);
        writeln!(
            out,
            "{:<18}{}",
            row_label(algorithm, operation),
            format_value(metric, summary.report.mean(&key))
        )?;
    }
    Ok(())
}

fn write_counts(out: &mut String, summary: &RunSummary<'_>) -> std::fmt::Result {
    for (algorithm, operation) in rows() {
        let key = SeriesKey::new(algorithm, operation, Metric::Time);
        writeln!(
            out,
            "{:<18}{}",
            row_label(algorithm, operation),
            summary.report.count(&key)
        )?;
    }
    writeln!(out, "{:<18}{}", "Skipped trials:", summary.stats.trials_skipped)
}

fn section_header(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", "-".repeat(50))
}

/// Console rendering of the results
pub fn format_console(summary: &RunSummary<'_>) -> Result<String> {
    let mut out = String::new();

    writeln!(out)?;
    writeln!(out, "=== {} ===", TITLE)?;
    writeln!(out, "Mean of {} runs:", summary.run.num_runs)?;

    writeln!(out)?;
    writeln!(out, "-- EXECUTION TIME (seconds) --")?;
    write_section(&mut out, summary, Metric::Time)?;

    writeln!(out)?;
    writeln!(out, "-- MEMORY USAGE (bytes) --")?;
    write_section(&mut out, summary, Metric::Memory)?;

    writeln!(out)?;
    writeln!(out, "-- SAMPLES --")?;
    write_counts(&mut out, summary)?;

    Ok(out)
}

/// Print the results to stdout
pub fn print_results(summary: &RunSummary<'_>) -> Result<()> {
    print!("{}", format_console(summary)?);
    Ok(())
}

/// Text report body
pub fn format_text_report(summary: &RunSummary<'_>) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "{}", TITLE)?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out)?;
    writeln!(out, "Number of runs: {}", summary.run.num_runs)?;
    writeln!(out, "Message size: {} bytes", summary.run.message_size)?;
    writeln!(
        out,
        "Algorithms: {} vs {}",
        summary.classical_name, summary.post_quantum_name
    )?;
    writeln!(out)?;

    section_header(&mut out, "EXECUTION TIME (seconds)")?;
    write_section(&mut out, summary, Metric::Time)?;
    writeln!(out)?;

    section_header(&mut out, "MEMORY USAGE (bytes)")?;
    write_section(&mut out, summary, Metric::Memory)?;
    writeln!(out)?;

    section_header(&mut out, "SAMPLES")?;
    write_counts(&mut out, summary)?;

    Ok(out)
}

/// Write the text report, overwriting any previous file
pub fn save_results_to_file(summary: &RunSummary<'_>, path: &Path) -> Result<()> {
    let body = format_text_report(summary)?;
    fs::write(path, body)?;
    info!("📝 Results saved to {}", path.display());
    Ok(())
}

/// One series as stored in the JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSeries {
    pub algorithm: AlgorithmSlot,
    pub operation: Operation,
    pub metric: Metric,
    pub mean: f64,
    pub count: usize,
}

/// JSON report document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub generated_at: DateTime<Utc>,
    pub num_runs: usize,
    pub message_size: usize,
    pub classical_algorithm: String,
    pub post_quantum_algorithm: String,
    pub stats: TrialStats,
    pub series: Vec<JsonSeries>,
}

impl JsonReport {
    pub fn from_summary(summary: &RunSummary<'_>) -> Self {
        let series = summary
            .report
            .iter()
            .map(|(key, s)| JsonSeries {
                algorithm: key.algorithm,
                operation: key.operation,
                metric: key.metric,
                mean: s.mean,
                count: s.count,
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            num_runs: summary.run.num_runs,
            message_size: summary.run.message_size,
            classical_algorithm: summary.classical_name.to_string(),
            post_quantum_algorithm: summary.post_quantum_name.to_string(),
            stats: *summary.stats,
            series,
        }
    }
}

/// Write `results.json` into `results_dir`
pub fn export_json(summary: &RunSummary<'_>, results_dir: &Path) -> Result<()> {
    let path = results_dir.join(JSON_REPORT_FILE);
    let document = JsonReport::from_summary(summary);
    let json = serde_json::to_string_pretty(&document)?;
    fs::write(&path, json)?;
    info!("📦 JSON report saved to {}", path.display());
    Ok(())
}
