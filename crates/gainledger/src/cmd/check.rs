//! gl-check - Validate a transactions file.
//!
//! Every record is validated on its own so that one bad row does not hide
//! the next. Duplicate transaction ids are reported as warnings.

use super::{init_tracing, OutputFormat};
use anyhow::{Context, Result};
use clap::Parser;
use gainledger_core::{normalize_records, CommodityStandard, DateRange, Transaction, TransactionRecord};
use gainledger_loader::CsvStore;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Validate a transactions file and report record errors.
#[derive(Parser, Debug)]
#[command(name = "gl-check")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The transactions file to check (CSV, or JSON with a `.json` extension)
    #[arg(value_name = "TRANSACTIONS")]
    pub file: PathBuf,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Suppress all output (just use exit code)
    #[arg(short, long)]
    pub quiet: bool,

    /// Show verbose output including timing information
    #[arg(short, long)]
    pub verbose: bool,
}

/// One problem found in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckDiagnostic {
    /// Data row, 1-based, header excluded.
    pub row: usize,
    /// Transaction id as written.
    pub transaction_id: String,
    /// "error" or "warning".
    pub severity: &'static str,
    /// What is wrong.
    pub message: String,
}

/// Result of checking a file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckSummary {
    /// Records read.
    pub records: usize,
    /// Records that passed validation.
    pub valid: usize,
    /// Error count.
    pub error_count: usize,
    /// Warning count.
    pub warning_count: usize,
    /// Valid records per standard.
    pub by_standard: BTreeMap<CommodityStandard, usize>,
    /// Locations seen on valid records, sentinel excluded.
    pub locations: BTreeSet<String>,
    /// Span of valid records.
    pub period: Option<DateRange>,
    /// Problems, in row order.
    pub diagnostics: Vec<CheckDiagnostic>,
}

/// Validate every record independently.
#[must_use]
pub fn check_records(records: Vec<TransactionRecord>) -> CheckSummary {
    let mut summary = CheckSummary {
        records: records.len(),
        ..CheckSummary::default()
    };
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut valid: Vec<Transaction> = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let row = index + 1;
        let id = record.id.trim().to_string();

        if !id.is_empty() {
            if let Some(first) = seen.get(&id) {
                summary.diagnostics.push(CheckDiagnostic {
                    row,
                    transaction_id: id.clone(),
                    severity: "warning",
                    message: format!("duplicate transaction id, first seen on row {first}"),
                });
            } else {
                seen.insert(id.clone(), row);
            }
        }

        match normalize_records(vec![record]) {
            Ok(mut txns) => valid.append(&mut txns),
            Err(e) => summary.diagnostics.push(CheckDiagnostic {
                row,
                transaction_id: id,
                severity: "error",
                message: e.to_string(),
            }),
        }
    }

    summary.valid = valid.len();
    summary.error_count = summary.diagnostics.iter().filter(|d| d.severity == "error").count();
    summary.warning_count = summary.diagnostics.len() - summary.error_count;
    summary.period = DateRange::spanning(valid.iter().map(|t| t.timestamp));
    for txn in &valid {
        *summary.by_standard.entry(txn.standard).or_default() += 1;
        for location in [&txn.source, &txn.destination] {
            if !location.is_sentinel() {
                summary.locations.insert(location.to_string());
            }
        }
    }
    summary
}

fn write_text<W: Write>(summary: &CheckSummary, writer: &mut W) -> io::Result<()> {
    for diagnostic in &summary.diagnostics {
        writeln!(
            writer,
            "{}: row {} ({}): {}",
            diagnostic.severity, diagnostic.row, diagnostic.transaction_id, diagnostic.message
        )?;
    }
    if !summary.diagnostics.is_empty() {
        writeln!(writer)?;
    }

    writeln!(writer, "Records:   {:>6}", summary.records)?;
    writeln!(writer, "Valid:     {:>6}", summary.valid)?;
    writeln!(writer, "Errors:    {:>6}", summary.error_count)?;
    writeln!(writer, "Warnings:  {:>6}", summary.warning_count)?;
    writeln!(writer, "Locations: {:>6}", summary.locations.len())?;
    for (standard, count) in &summary.by_standard {
        writeln!(writer, "  {:<10} {:>6}", standard.to_string(), count)?;
    }
    if let Some(period) = &summary.period {
        writeln!(writer, "First:     {}", period.start.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(writer, "Last:      {}", period.end.format("%Y-%m-%d %H:%M:%S"))?;
    }
    Ok(())
}

/// Run the check, writing results to `writer`.
pub fn run<W: Write>(args: &Args, writer: &mut W) -> Result<ExitCode> {
    let records = CsvStore::read_records(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    let summary = check_records(records);

    if !args.quiet {
        match args.format {
            OutputFormat::Text => write_text(&summary, writer)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, &summary)?;
                writeln!(writer)?;
            }
        }
    }

    if summary.error_count > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Main entry point for the check command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(args.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&args, &mut out) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, quantity: &str) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            source: "0x0000".to_string(),
            destination: "WH_A".to_string(),
            item_type: "Wheat".to_string(),
            standard: "bulk".to_string(),
            quantity: quantity.to_string(),
            total_price: "100".to_string(),
            timestamp: "2024-01-01".to_string(),
            ..TransactionRecord::default()
        }
    }

    #[test]
    fn test_all_errors_reported() {
        let summary = check_records(vec![
            record("EX1", "10"),
            record("EX2", "0"),
            record("EX3", "abc"),
            record("EX1", "5"),
        ]);

        assert_eq!(summary.records, 4);
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.diagnostics[0].row, 2);
        assert_eq!(summary.diagnostics[2].severity, "warning");
        assert_eq!(summary.locations.len(), 1);
        assert_eq!(summary.by_standard.get(&CommodityStandard::Fungible), Some(&2));
    }

    #[test]
    fn test_clean_file() {
        let summary = check_records(vec![record("EX1", "10")]);
        assert_eq!(summary.error_count, 0);
        assert!(summary.diagnostics.is_empty());
        assert!(summary.period.is_some());
    }
}
