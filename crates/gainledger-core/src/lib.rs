//! Core types for gainledger
//!
//! This crate provides the fundamental types used throughout the gainledger project:
//!
//! - [`LocationId`] - A storage location, or the `0x0000` sentinel for "outside the system"
//! - [`CommodityStandard`] - Fungible, serialized or batched goods
//! - [`Commodity`] - The location-free identity of a good
//! - [`CommodityKey`] - A commodity held at one location (one FIFO ledger)
//! - [`Transaction`] - A priced movement of goods between two locations
//! - [`TransactionRecord`] - The raw, unvalidated form delivered by data sources
//! - [`Entity`] - A company owning a set of locations
//! - [`normalize_records`] / [`order_transactions`] - Validation and chronological ordering
//!
//! # Example
//!
//! ```
//! use gainledger_core::{order_transactions, LocationId, Transaction};
//! use chrono::{TimeZone, Utc};
//! use rust_decimal_macros::dec;
//!
//! let sale = Transaction::new(
//!     "EX2",
//!     "WH_A",
//!     "WH_B",
//!     "Wheat",
//!     dec!(50),
//!     dec!(12000),
//!     Utc.with_ymd_and_hms(2023, 6, 15, 14, 30, 0).unwrap(),
//! );
//! let purchase = Transaction::new(
//!     "EX1",
//!     LocationId::SENTINEL,
//!     "WH_A",
//!     "Wheat",
//!     dec!(100),
//!     dec!(20000),
//!     Utc.with_ymd_and_hms(2023, 6, 1, 10, 0, 0).unwrap(),
//! );
//!
//! let ordered = order_transactions(vec![sale, purchase]).unwrap();
//! assert_eq!(ordered[0].id, "EX1");
//! assert!(ordered[0].is_mint());
//! assert!(ordered[1].is_outflow_for(&LocationId::from("WH_A")));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commodity;
pub mod entity;
pub mod location;
pub mod normalize;
pub mod range;
pub mod transaction;

pub use commodity::{Commodity, CommodityKey, CommodityStandard};
pub use entity::Entity;
pub use location::LocationId;
pub use normalize::{normalize_records, order_transactions, parse_timestamp, ValidationError};
pub use range::{DateRange, TimeRange};
pub use transaction::{Transaction, TransactionRecord};

// Re-export commonly used external types
pub use chrono::{DateTime, Utc};
pub use rust_decimal::Decimal;
