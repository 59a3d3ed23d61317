//! gl-location - Realized FIFO gains for one storage location.
//!
//! # Usage
//!
//! ```bash
//! gl-location exchanges.csv --directory warehouses.csv --location WH_A
//! gl-location exchanges.csv -d warehouses.csv -l WH_A --from 2024-01-01 --format json
//! ```

use super::{init_tracing, AnalysisArgs, OutputFormat};
use crate::flow::{analyze_location, FlowError};
use crate::report::write_location_report;
use anyhow::{Context, Result};
use clap::Parser;
use gainledger_core::LocationId;
use gainledger_loader::CsvStore;
use std::io::{self, Write};
use std::process::ExitCode;

/// Compute realized FIFO gains for one location.
#[derive(Parser, Debug)]
#[command(name = "gl-location")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The location to analyse
    #[arg(short, long, value_name = "ID")]
    pub location: String,

    #[command(flatten)]
    pub common: AnalysisArgs,
}

/// Run the command, writing the report to `writer`.
pub fn run<W: Write>(args: &Args, writer: &mut W) -> Result<ExitCode> {
    let mut store = CsvStore::open(&args.common.transactions, &args.common.directory)
        .context("failed to open transaction store")?;
    let location = LocationId::new(args.location.trim());

    let result = analyze_location(&store, &location, &args.common.range(), args.common.options());
    store.close();

    let report = match result {
        Ok(report) => report,
        Err(e) if e.is_analysis_error() => {
            eprintln!("error: {e}");
            return Ok(ExitCode::from(1));
        }
        Err(FlowError::Source(e)) => return Err(e).context("failed to read transactions"),
        Err(e) => return Err(e.into()),
    };

    match args.common.format {
        OutputFormat::Text => write_location_report(&report, writer)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, &report)?;
            writeln!(writer)?;
        }
    }

    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Main entry point for the location command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.common.verbose);

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
