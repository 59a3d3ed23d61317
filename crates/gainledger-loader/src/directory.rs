//! Location directory: which entity owns which location.

use gainledger_core::{Entity, LocationId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::{Result, SourceError};

/// One row of the directory file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Location id.
    #[serde(alias = "warehouse_id")]
    pub location_id: String,
    /// Owning entity id.
    #[serde(alias = "company_id")]
    pub entity_id: String,
    /// Owning entity name; the id is used when absent.
    #[serde(default, alias = "company_name")]
    pub entity_name: Option<String>,
}

/// Ownership map from locations to entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDirectory {
    owners: BTreeMap<LocationId, String>,
    entities: BTreeMap<String, Entity>,
}

impl LocationDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a directory CSV file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file).map_err(|e| match e {
            SourceError::Csv { source, .. } => SourceError::Csv {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Read directory CSV from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut directory = Self::new();
        for row in csv.deserialize::<DirectoryRecord>() {
            let row = row.map_err(|source| SourceError::Csv {
                path: "<directory>".into(),
                source,
            })?;
            let name = row
                .entity_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| row.entity_id.clone());
            directory.insert(row.location_id, row.entity_id, name)?;
        }
        Ok(directory)
    }

    /// Register `location` as owned by `entity_id`.
    ///
    /// Listing the same location twice for one entity is harmless; listing it
    /// for two entities fails. The sentinel is never registered.
    pub fn insert(
        &mut self,
        location: impl Into<LocationId>,
        entity_id: impl Into<String>,
        entity_name: impl Into<String>,
    ) -> Result<()> {
        let location = location.into();
        let entity_id = entity_id.into();
        if location.is_sentinel() {
            return Ok(());
        }

        if let Some(existing) = self.owners.get(&location) {
            if existing != &entity_id {
                return Err(SourceError::ConflictingOwner {
                    location,
                    first: existing.clone(),
                    second: entity_id,
                });
            }
        }

        let entity_name = entity_name.into();
        self.entities
            .entry(entity_id.clone())
            .or_insert_with(|| Entity::new(entity_id.clone(), entity_name))
            .add_location(location.clone());
        self.owners.insert(location, entity_id);
        Ok(())
    }

    /// Whether the location is listed.
    #[must_use]
    pub fn contains(&self, location: &LocationId) -> bool {
        self.owners.contains_key(location)
    }

    /// Id of the entity owning `location`.
    #[must_use]
    pub fn owner(&self, location: &LocationId) -> Option<&str> {
        self.owners.get(location).map(String::as_str)
    }

    /// The entity with this id.
    #[must_use]
    pub fn entity(&self, entity_id: &str) -> Option<&Entity> {
        self.entities.get(entity_id)
    }

    /// All entities, sorted by id.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of listed locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// No locations listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTORY: &str = "\
location_id,entity_id,entity_name
WH_A,ACME,Acme Storage
WH_B, ACME ,Acme Storage
WH_C,GLOBEX,
";

    #[test]
    fn test_from_reader() {
        let dir = LocationDirectory::from_reader(DIRECTORY.as_bytes()).unwrap();
        assert_eq!(dir.len(), 3);

        let acme = dir.entity("ACME").unwrap();
        assert_eq!(acme.name, "Acme Storage");
        assert_eq!(acme.locations.len(), 2);
        assert_eq!(dir.owner(&LocationId::from("WH_B")), Some("ACME"));

        // Missing name falls back to the id
        assert_eq!(dir.entity("GLOBEX").unwrap().name, "GLOBEX");
    }

    #[test]
    fn test_original_column_names() {
        let csv = "warehouse_id,company_id\nWH_9,CO_1\n";
        let dir = LocationDirectory::from_reader(csv.as_bytes()).unwrap();
        assert!(dir.contains(&LocationId::from("WH_9")));
    }

    #[test]
    fn test_conflicting_owner() {
        let mut dir = LocationDirectory::new();
        dir.insert("WH_A", "ACME", "Acme").unwrap();
        dir.insert("WH_A", "ACME", "Acme").unwrap();
        assert!(matches!(
            dir.insert("WH_A", "GLOBEX", "Globex"),
            Err(SourceError::ConflictingOwner { .. })
        ));
    }

    #[test]
    fn test_sentinel_never_listed() {
        let mut dir = LocationDirectory::new();
        dir.insert("0x0000", "ACME", "Acme").unwrap();
        assert!(dir.is_empty());
        assert!(dir.entity("ACME").is_none());
    }
}
