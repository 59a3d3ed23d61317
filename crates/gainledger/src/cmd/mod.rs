//! Command implementations for CLI tools.
//!
//! Each module contains the full implementation for a command,
//! which can be invoked by thin wrapper binaries.

pub mod check;
pub mod entity_cmd;
pub mod location_cmd;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Args, ValueEnum};
use gainledger_booking::{AnalysisOptions, OversellPolicy, TransferPolicy};
use gainledger_core::{parse_timestamp, TimeRange};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for tooling integration
    Json,
}

/// Arguments shared by the analysis commands.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Transactions file (CSV, or JSON with a `.json` extension)
    #[arg(value_name = "TRANSACTIONS")]
    pub transactions: PathBuf,

    /// Location directory CSV (`location_id,entity_id,entity_name`)
    #[arg(short, long, value_name = "DIR_CSV")]
    pub directory: PathBuf,

    /// Only include transactions at or after this time (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_name = "WHEN", value_parser = parse_start)]
    pub from: Option<DateTime<Utc>>,

    /// Only include transactions at or before this time (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_name = "WHEN", value_parser = parse_end)]
    pub to: Option<DateTime<Utc>>,

    /// Fail a commodity when a sale exceeds the inventory on hand
    #[arg(long)]
    pub strict: bool,

    /// How internal transfers move cost basis: carry or exclude
    #[arg(long, value_name = "POLICY", default_value = "carry")]
    pub transfer_policy: TransferPolicy,

    /// Process commodities one at a time instead of in parallel
    #[arg(long)]
    pub sequential: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Name recorded on the report
    #[arg(long, env = "REPORTER_NAME", default_value = AnalysisOptions::DEFAULT_REPORTER)]
    pub reporter: String,

    /// Show verbose output including timing information
    #[arg(short, long)]
    pub verbose: bool,
}

impl AnalysisArgs {
    /// Library options for these arguments.
    #[must_use]
    pub fn options(&self) -> AnalysisOptions {
        let oversell = if self.strict {
            OversellPolicy::Strict
        } else {
            OversellPolicy::Lenient
        };
        AnalysisOptions::new()
            .with_oversell(oversell)
            .with_transfers(self.transfer_policy)
            .with_parallel(!self.sequential)
            .with_reporter(self.reporter.clone())
    }

    /// Time window for fetching transactions.
    #[must_use]
    pub const fn range(&self) -> TimeRange {
        TimeRange::new(self.from, self.to)
    }
}

/// Parse a lower bound; a bare date means its first instant.
fn parse_start(value: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(value).ok_or_else(|| format!("invalid date or timestamp: {value}"))
}

/// Parse an upper bound; a bare date means its last instant.
fn parse_end(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        if let Some(end) = date.and_hms_nano_opt(23, 59, 59, 999_999_999) {
            return Ok(Utc.from_utc_datetime(&end));
        }
    }
    parse_start(value)
}

/// Install the tracing subscriber.
///
/// `-v` enables debug output with span timings; otherwise `RUST_LOG` decides
/// and warnings are shown by default. Logs go to stderr.
pub fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(LevelFilter::WARN.into())
                    .from_env_lossy(),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: AnalysisArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["gl", "tx.csv", "--directory", "dir.csv"]).unwrap();
        let options = cli.args.options();
        assert_eq!(options.oversell, OversellPolicy::Lenient);
        assert_eq!(options.transfers, TransferPolicy::CarryCostBasis);
        assert!(options.parallel);
        assert_eq!(cli.args.format, OutputFormat::Text);
        assert!(cli.args.range().is_unbounded());
    }

    #[test]
    fn test_flags() {
        let cli = TestCli::try_parse_from([
            "gl",
            "tx.json",
            "-d",
            "dir.csv",
            "--strict",
            "--sequential",
            "--transfer-policy",
            "exclude",
            "--format",
            "json",
            "--reporter",
            "Audit",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
        ])
        .unwrap();
        let options = cli.args.options();
        assert_eq!(options.oversell, OversellPolicy::Strict);
        assert_eq!(options.transfers, TransferPolicy::Exclude);
        assert!(!options.parallel);
        assert_eq!(options.reporter, "Audit");

        let range = cli.args.range();
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 1, 31, 18, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap()));
    }

    #[test]
    fn test_bad_date() {
        assert!(TestCli::try_parse_from(["gl", "tx.csv", "-d", "d.csv", "--from", "soon"]).is_err());
        assert!(TestCli::try_parse_from(["gl", "tx.csv", "-d", "d.csv", "--transfer-policy", "move"]).is_err());
    }
}
