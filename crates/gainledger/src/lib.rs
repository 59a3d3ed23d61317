//! Command-line tools for FIFO gain analysis.
//!
//! This crate provides command-line tools over a transactions file and a
//! location directory:
//!
//! - `gl-location`: Realized gains, cash flow and holdings for one location
//! - `gl-entity`: Consolidated gains across every location an entity owns
//! - `gl-check`: Validate a transactions file
//!
//! # Example Usage
//!
//! ```bash
//! gl-check exchanges.csv
//! gl-location exchanges.csv -d warehouses.csv -l WH_A
//! gl-entity exchanges.csv -d warehouses.csv -e ACME --format json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod flow;
pub mod report;
