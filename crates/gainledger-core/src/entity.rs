//! Economic entities owning storage locations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{LocationId, Transaction};

/// A company that owns a set of locations.
///
/// Membership is static for an analysis run. The sentinel location is never
/// owned, even if it is listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owned locations.
    pub locations: BTreeSet<LocationId>,
}

impl Entity {
    /// Create an entity without locations.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            locations: BTreeSet::new(),
        }
    }

    /// Add an owned location. The sentinel is ignored.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<LocationId>) -> Self {
        self.add_location(location);
        self
    }

    /// Add an owned location in place. The sentinel is ignored.
    pub fn add_location(&mut self, location: impl Into<LocationId>) {
        let location = location.into();
        if !location.is_sentinel() {
            self.locations.insert(location);
        }
    }

    /// Check whether the entity owns `location`.
    #[must_use]
    pub fn owns(&self, location: &LocationId) -> bool {
        !location.is_sentinel() && self.locations.contains(location)
    }

    /// Both endpoints of `txn` are owned by this entity.
    #[must_use]
    pub fn is_internal(&self, txn: &Transaction) -> bool {
        self.owns(&txn.source) && self.owns(&txn.destination)
    }

    /// At least one endpoint of `txn` is owned by this entity.
    #[must_use]
    pub fn touches(&self, txn: &Transaction) -> bool {
        self.owns(&txn.source) || self.owns(&txn.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn txn(from: &str, to: &str) -> Transaction {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Transaction::new("EX", from, to, "Wheat", dec!(1), dec!(1), ts)
    }

    #[test]
    fn test_sentinel_never_owned() {
        let entity = Entity::new("C1", "Acme").with_location(LocationId::SENTINEL);
        assert!(entity.locations.is_empty());
        assert!(!entity.owns(&LocationId::sentinel()));
    }

    #[test]
    fn test_internal_and_touches() {
        let entity = Entity::new("C1", "Acme").with_location("A").with_location("B");
        assert!(entity.is_internal(&txn("A", "B")));
        assert!(!entity.is_internal(&txn("A", "X")));
        assert!(entity.touches(&txn("X", "B")));
        assert!(!entity.touches(&txn("X", "Y")));
        assert!(!entity.is_internal(&txn(LocationId::SENTINEL, "A")));
    }
}
