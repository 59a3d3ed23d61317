//! Commodity standards, commodities and commodity keys.
//!
//! A [`Commodity`] is what is being traded (standard + item type, plus the
//! batch for batched goods). A [`CommodityKey`] pins a commodity to one
//! location and identifies one independent FIFO ledger: lots and sales under
//! different keys never interact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::LocationId;

/// How units of a commodity are told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommodityStandard {
    /// Bulk, interchangeable goods (wheat, oil, steel). Quantity is a measure.
    #[default]
    Fungible,
    /// Unique items (cars, artworks). Quantity is a whole unit count.
    Serialized,
    /// Goods tracked per production batch. Each batch is its own commodity.
    Batched,
}

impl CommodityStandard {
    /// All standards, in report order.
    pub const ALL: [Self; 3] = [Self::Fungible, Self::Serialized, Self::Batched];

    /// Check if this is the bulk (fungible) standard.
    #[must_use]
    pub const fn is_bulk(self) -> bool {
        matches!(self, Self::Fungible)
    }

    /// Check if this is the serialized standard.
    #[must_use]
    pub const fn is_serialized(self) -> bool {
        matches!(self, Self::Serialized)
    }

    /// Check if this is the batched standard.
    #[must_use]
    pub const fn is_batched(self) -> bool {
        matches!(self, Self::Batched)
    }
}

impl FromStr for CommodityStandard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fungible" | "bulk" => Ok(Self::Fungible),
            "serialized" | "unique" => Ok(Self::Serialized),
            "batched" | "batch" => Ok(Self::Batched),
            _ => Err(format!("unknown commodity standard: {s}")),
        }
    }
}

impl fmt::Display for CommodityStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fungible => write!(f, "fungible"),
            Self::Serialized => write!(f, "serialized"),
            Self::Batched => write!(f, "batched"),
        }
    }
}

/// The location-free identity of a traded good.
///
/// # Examples
///
/// ```
/// use gainledger_core::{Commodity, CommodityStandard};
///
/// let wheat = Commodity::fungible("Wheat");
/// assert_eq!(wheat.to_string(), "Wheat (fungible)");
///
/// let wine = Commodity::batched("Wine", "B-2021-07");
/// assert_eq!(wine.standard, CommodityStandard::Batched);
/// assert_eq!(wine.to_string(), "Wine #B-2021-07 (batched)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Commodity {
    /// Commodity standard.
    pub standard: CommodityStandard,
    /// Item category, e.g. "Wheat" or "Steel".
    pub item_type: String,
    /// Batch identifier, only set for batched goods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

impl Commodity {
    /// Create a commodity. The batch id is dropped unless the standard is batched.
    #[must_use]
    pub fn new(
        standard: CommodityStandard,
        item_type: impl Into<String>,
        batch_id: Option<String>,
    ) -> Self {
        Self {
            standard,
            item_type: item_type.into(),
            batch_id: batch_id.filter(|_| standard.is_batched()),
        }
    }

    /// A bulk commodity.
    #[must_use]
    pub fn fungible(item_type: impl Into<String>) -> Self {
        Self::new(CommodityStandard::Fungible, item_type, None)
    }

    /// A serialized commodity.
    #[must_use]
    pub fn serialized(item_type: impl Into<String>) -> Self {
        Self::new(CommodityStandard::Serialized, item_type, None)
    }

    /// One batch of a batched commodity.
    #[must_use]
    pub fn batched(item_type: impl Into<String>, batch_id: impl Into<String>) -> Self {
        Self::new(CommodityStandard::Batched, item_type, Some(batch_id.into()))
    }

    /// Pin this commodity to a location.
    #[must_use]
    pub fn at(&self, location: impl Into<LocationId>) -> CommodityKey {
        CommodityKey {
            location: location.into(),
            commodity: self.clone(),
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.item_type)?;
        if let Some(batch) = &self.batch_id {
            write!(f, " #{batch}")?;
        }
        write!(f, " ({})", self.standard)
    }
}

/// A commodity held at one location: the isolation unit for FIFO accounting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommodityKey {
    /// Location holding the inventory.
    pub location: LocationId,
    /// What is held.
    pub commodity: Commodity,
}

impl CommodityKey {
    /// Create a key.
    #[must_use]
    pub fn new(location: impl Into<LocationId>, commodity: Commodity) -> Self {
        Self {
            location: location.into(),
            commodity,
        }
    }

    /// Standard of the keyed commodity.
    #[must_use]
    pub const fn standard(&self) -> CommodityStandard {
        self.commodity.standard
    }
}

impl fmt::Display for CommodityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.location, self.commodity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_from_str() {
        assert_eq!("bulk".parse(), Ok(CommodityStandard::Fungible));
        assert_eq!("Fungible".parse(), Ok(CommodityStandard::Fungible));
        assert_eq!("SERIALIZED".parse(), Ok(CommodityStandard::Serialized));
        assert_eq!("unique".parse(), Ok(CommodityStandard::Serialized));
        assert_eq!(" batched ".parse(), Ok(CommodityStandard::Batched));
        assert!("liquid".parse::<CommodityStandard>().is_err());
    }

    #[test]
    fn test_standard_display_roundtrip() {
        for standard in CommodityStandard::ALL {
            assert_eq!(standard.to_string().parse(), Ok(standard));
        }
    }

    #[test]
    fn test_batch_dropped_for_non_batched() {
        let c = Commodity::new(CommodityStandard::Fungible, "Wheat", Some("B1".to_string()));
        assert_eq!(c.batch_id, None);
    }

    #[test]
    fn test_batches_are_distinct_commodities() {
        assert_ne!(Commodity::batched("Wine", "B1"), Commodity::batched("Wine", "B2"));
    }

    #[test]
    fn test_key_isolation_by_location() {
        let wheat = Commodity::fungible("Wheat");
        assert_ne!(wheat.at("WH_A"), wheat.at("WH_B"));
        assert_eq!(wheat.at("WH_A"), CommodityKey::new("WH_A", wheat.clone()));
    }

    #[test]
    fn test_key_display() {
        let key = Commodity::serialized("Ferrari").at("WH_A");
        assert_eq!(key.to_string(), "WH_A/Ferrari (serialized)");
        assert_eq!(key.standard(), CommodityStandard::Serialized);
    }
}
