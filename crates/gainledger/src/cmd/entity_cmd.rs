//! gl-entity - Consolidated gains across the locations of one entity.
//!
//! Transfers between two locations of the entity are reported separately
//! and never count as gains.
//!
//! # Usage
//!
//! ```bash
//! gl-entity exchanges.csv --directory warehouses.csv --entity ACME
//! gl-entity exchanges.csv -d warehouses.csv -e ACME --transfer-policy exclude
//! ```

use super::{init_tracing, AnalysisArgs, OutputFormat};
use crate::flow::{analyze_entity, FlowError};
use crate::report::write_entity_report;
use anyhow::{Context, Result};
use clap::Parser;
use gainledger_loader::CsvStore;
use std::io::{self, Write};
use std::process::ExitCode;

/// Consolidate realized FIFO gains across an entity's locations.
#[derive(Parser, Debug)]
#[command(name = "gl-entity")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The entity to analyse
    #[arg(short, long, value_name = "ID")]
    pub entity: String,

    #[command(flatten)]
    pub common: AnalysisArgs,
}

/// Run the command, writing the report to `writer`.
pub fn run<W: Write>(args: &Args, writer: &mut W) -> Result<ExitCode> {
    let mut store = CsvStore::open(&args.common.transactions, &args.common.directory)
        .context("failed to open transaction store")?;

    let result = analyze_entity(
        &store,
        args.entity.trim(),
        &args.common.range(),
        args.common.options(),
    );
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
        OutputFormat::Text => write_entity_report(&report, writer)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, &report)?;
            writeln!(writer)?;
        }
    }

    if report.failures().next().is_none() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Main entry point for the entity command.
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
