//! FIFO cost-basis booking and gains aggregation.
//!
//! This crate provides:
//! - [`CommodityLedger`] - FIFO lots and sale allocations for one commodity key
//! - [`LocationGainsCalculator`] - Realized gains for one location
//! - [`EntityConsolidator`] - Gains across an entity's locations, internal transfers excluded
//! - [`LocationGainReport`] / [`EntityGainReport`] - Serializable results
//!
//! Independent commodities are evaluated in parallel on the rayon pool unless
//! [`AnalysisOptions::parallel`] is turned off; results are identical either way.
//!
//! # Example
//!
//! ```
//! use gainledger_booking::{AnalysisOptions, EntityConsolidator};
//! use gainledger_core::{Entity, Transaction};
//! use chrono::{TimeZone, Utc};
//! use rust_decimal_macros::dec;
//!
//! let acme = Entity::new("ACME", "Acme Storage")
//!     .with_location("WH_A")
//!     .with_location("WH_B");
//! let day = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
//!
//! let txns = vec![
//!     Transaction::new("EX1", "0x0000", "WH_A", "Wheat", dec!(100), dec!(10000), day(1)),
//!     Transaction::new("EX2", "WH_A", "WH_B", "Wheat", dec!(100), dec!(12000), day(2)),
//!     Transaction::new("EX3", "WH_B", "WH_X", "Wheat", dec!(100), dec!(15000), day(3)),
//! ];
//!
//! let report = EntityConsolidator::new(acme, AnalysisOptions::default())
//!     .unwrap()
//!     .consolidate(&txns)
//!     .unwrap();
//!
//! assert_eq!(report.internal_transfer_count, 1);
//! assert_eq!(report.internal_transfer_value, dec!(12000));
//! assert_eq!(report.total_realized_gain, dec!(5000));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod engine;
pub mod entity;
pub mod error;
pub mod ledger;
pub mod location;
pub mod options;
pub mod report;

pub use entity::{Classification, Direction, EntityConsolidator};
pub use error::{GainsError, Result};
pub use ledger::{Allocation, CommodityLedger, Lot, LotSlice, SaleOutcome, TransferOutcome};
pub use location::LocationGainsCalculator;
pub use options::{AnalysisOptions, OversellPolicy, TransferPolicy};
pub use report::{
    CommodityActivity, EntityGainReport, KeyBreakdown, KeyFailure, LocationGainReport,
    StandardSummary,
};
