//! Transaction sources for gainledger.
//!
//! The calculators never reach for a data store themselves. A caller opens a
//! [`TransactionSource`], hands it to the analysis flow, and closes it when
//! the run is over. Two sources are provided:
//!
//! - [`CsvStore`] - a transactions file (CSV or JSON) plus a CSV location directory
//! - [`MemoryStore`] - records and entities held in memory, for tests and embedding
//!
//! # Example
//!
//! ```no_run
//! use gainledger_core::{LocationId, TimeRange};
//! use gainledger_loader::{CsvStore, TransactionSource};
//! use std::path::Path;
//!
//! let mut store = CsvStore::open(Path::new("exchanges.csv"), Path::new("warehouses.csv"))?;
//! let records = store.fetch_transactions(&[LocationId::from("WH_A")], &TimeRange::all())?;
//! println!("{} records", records.len());
//! store.close();
//! # Ok::<(), gainledger_loader::SourceError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod csv_store;
mod directory;
mod memory;

pub use csv_store::CsvStore;
pub use directory::{DirectoryRecord, LocationDirectory};
pub use memory::MemoryStore;

use gainledger_core::{parse_timestamp, Entity, LocationId, TimeRange, TransactionRecord};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by transaction sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// IO error reading a file.
    #[error("failed to read file {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A CSV file could not be parsed.
    #[error("invalid CSV in {path}: {source}")]
    Csv {
        /// The offending file.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A JSON file could not be parsed.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// The offending file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A location is listed for two different entities.
    #[error("location {location} is listed for both {first} and {second}")]
    ConflictingOwner {
        /// The location.
        location: LocationId,
        /// Entity listed first.
        first: String,
        /// Entity listed later.
        second: String,
    },

    /// The location is not known to the source.
    #[error("location {location} does not exist")]
    UnknownLocation {
        /// The missing location.
        location: LocationId,
    },

    /// The source was used after `close`.
    #[error("transaction source is closed")]
    Closed,
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Typed access to transaction records and location ownership.
pub trait TransactionSource {
    /// Records touching any of `locations` whose timestamp falls in `range`.
    ///
    /// Records with an unparseable timestamp are always returned, so the
    /// normalizer can report them instead of them silently disappearing.
    fn fetch_transactions(
        &self,
        locations: &[LocationId],
        range: &TimeRange,
    ) -> Result<Vec<TransactionRecord>>;

    /// Whether the location is known.
    fn location_exists(&self, location: &LocationId) -> Result<bool>;

    /// The entity with this id and its locations, if known.
    fn resolve_entity(&self, entity_id: &str) -> Result<Option<Entity>>;

    /// Fail with [`SourceError::UnknownLocation`] unless the location is known.
    fn require_location(&self, location: &LocationId) -> Result<()> {
        if self.location_exists(location)? {
            Ok(())
        } else {
            Err(SourceError::UnknownLocation {
                location: location.clone(),
            })
        }
    }
}

/// Shared record filter for in-memory sources.
pub(crate) fn select_records(
    records: &[TransactionRecord],
    locations: &[LocationId],
    range: &TimeRange,
) -> Vec<TransactionRecord> {
    records
        .iter()
        .filter(|r| locations.iter().any(|l| r.touches(l.as_str())))
        .filter(|r| parse_timestamp(&r.timestamp).map_or(true, |ts| range.contains(ts)))
        .cloned()
        .collect()
}
