//! File-backed transaction source.

use gainledger_core::{Entity, LocationId, TimeRange, TransactionRecord};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::directory::LocationDirectory;
use crate::{select_records, Result, SourceError, TransactionSource};

#[derive(Debug)]
struct Loaded {
    records: Vec<TransactionRecord>,
    directory: LocationDirectory,
}

/// Transactions and directory read from files.
///
/// Files are read once by [`CsvStore::open`]; queries run against memory
/// until [`CsvStore::close`] releases it, after which every query fails
/// with [`SourceError::Closed`].
#[derive(Debug)]
pub struct CsvStore {
    path: PathBuf,
    loaded: Option<Loaded>,
}

impl CsvStore {
    /// Read the transactions file and the location directory.
    ///
    /// A `.json` transactions file holds an array of records; anything else
    /// is read as CSV with a header row. JSON records may carry numbers for
    /// numeric fields and a list for `item_ids`/`serial_ids`.
    pub fn open(transactions: &Path, directory: &Path) -> Result<Self> {
        let records = read_transactions(transactions)?;
        let directory = LocationDirectory::load(directory)?;
        info!(
            path = %transactions.display(),
            records = records.len(),
            locations = directory.len(),
            "transaction store opened"
        );
        Ok(Self {
            path: transactions.to_path_buf(),
            loaded: Some(Loaded { records, directory }),
        })
    }

    /// Read a transactions file on its own, without a directory.
    ///
    /// Used for validation runs that never resolve locations.
    pub fn read_records(path: &Path) -> Result<Vec<TransactionRecord>> {
        read_transactions(path)
    }

    /// Release the loaded data.
    pub fn close(&mut self) {
        if self.loaded.take().is_some() {
            debug!(path = %self.path.display(), "transaction store closed");
        }
    }

    /// Whether the store is still open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.loaded.is_some()
    }

    /// The transactions file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn loaded(&self) -> Result<&Loaded> {
        self.loaded.as_ref().ok_or(SourceError::Closed)
    }
}

impl TransactionSource for CsvStore {
    fn fetch_transactions(
        &self,
        locations: &[LocationId],
        range: &TimeRange,
    ) -> Result<Vec<TransactionRecord>> {
        let loaded = self.loaded()?;
        let records = select_records(&loaded.records, locations, range);
        debug!(locations = locations.len(), %range, fetched = records.len(), "fetched transactions");
        Ok(records)
    }

    fn location_exists(&self, location: &LocationId) -> Result<bool> {
        Ok(self.loaded()?.directory.contains(location))
    }

    fn resolve_entity(&self, entity_id: &str) -> Result<Option<Entity>> {
        Ok(self.loaded()?.directory.entity(entity_id).cloned())
    }
}

/// Read every record of a transactions file without filtering.
fn read_transactions(path: &Path) -> Result<Vec<TransactionRecord>> {
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let json_error = |source: serde_json::Error| SourceError::Json {
            path: path.to_path_buf(),
            source,
        };
        let rows: Vec<Value> = serde_json::from_reader(BufReader::new(file)).map_err(json_error)?;
        return rows
            .into_iter()
            .map(|row| serde_json::from_value(as_text(row)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(json_error);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(BufReader::new(file));

    reader
        .deserialize::<TransactionRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Rewrite a JSON record into the all-text shape of a CSV row.
///
/// Numbers become their decimal text and lists become `;`-separated text.
fn as_text(row: Value) -> Value {
    match row {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(name, value)| (name, field_text(value)))
                .collect(),
        ),
        other => other,
    }
}

fn field_text(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Array(items) => Value::String(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(";"),
        ),
        other => other,
    }
}
