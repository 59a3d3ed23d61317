//! In-memory transaction source.

use gainledger_core::{Entity, LocationId, TimeRange, TransactionRecord};

use crate::directory::LocationDirectory;
use crate::{select_records, Result, TransactionSource};

/// Records and ownership held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<TransactionRecord>,
    directory: LocationDirectory,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from records and a directory.
    #[must_use]
    pub const fn with_parts(records: Vec<TransactionRecord>, directory: LocationDirectory) -> Self {
        Self { records, directory }
    }

    /// Add a record.
    pub fn push(&mut self, record: TransactionRecord) {
        self.records.push(record);
    }

    /// Mutable access to the directory.
    pub fn directory_mut(&mut self) -> &mut LocationDirectory {
        &mut self.directory
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No records held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TransactionSource for MemoryStore {
    fn fetch_transactions(
        &self,
        locations: &[LocationId],
        range: &TimeRange,
    ) -> Result<Vec<TransactionRecord>> {
        Ok(select_records(&self.records, locations, range))
    }

    fn location_exists(&self, location: &LocationId) -> Result<bool> {
        Ok(self.directory.contains(location))
    }

    fn resolve_entity(&self, entity_id: &str) -> Result<Option<Entity>> {
        Ok(self.directory.entity(entity_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceError;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.directory_mut().insert("WH_A", "ACME", "Acme").unwrap();
        store.push(TransactionRecord {
            id: "EX1".to_string(),
            source: "0x0000".to_string(),
            destination: "WH_A".to_string(),
            timestamp: "2024-01-01".to_string(),
            ..TransactionRecord::default()
        });

        let a = LocationId::from("WH_A");
        assert_eq!(store.len(), 1);
        assert!(store.location_exists(&a).unwrap());
        assert!(store.require_location(&a).is_ok());
        assert!(matches!(
            store.require_location(&LocationId::from("WH_Z")),
            Err(SourceError::UnknownLocation { .. })
        ));
        assert_eq!(store.fetch_transactions(&[a], &TimeRange::all()).unwrap().len(), 1);
        assert_eq!(
            store.resolve_entity("ACME").unwrap().map(|e| e.locations.len()),
            Some(1)
        );
        assert!(store.resolve_entity("NOPE").unwrap().is_none());
    }
}
