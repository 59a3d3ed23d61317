//! Transactions between storage locations.
//!
//! A [`Transaction`] is the canonical, validated form of an exchange: a
//! quantity of one commodity moved from a source location to a destination
//! location for a total price. A [`TransactionRecord`] is the raw form as it
//! arrives from a data source (every field still text); see
//! [`crate::normalize_records`] for the conversion.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Commodity, CommodityKey, CommodityStandard, LocationId};

/// A priced movement of goods between two locations.
///
/// From the point of view of one location, a transaction is an *inflow*
/// (purchase) when the location is the destination and an *outflow* (sale)
/// when it is the source.
///
/// # Examples
///
/// ```
/// use gainledger_core::{CommodityStandard, LocationId, Transaction};
/// use chrono::{TimeZone, Utc};
/// use rust_decimal_macros::dec;
///
/// let txn = Transaction::new(
///     "EX001",
///     "WH_A12345",
///     "WH_B67890",
///     "Wheat",
///     dec!(100.5),
///     dec!(5025.00),
///     Utc.with_ymd_and_hms(2023, 6, 15, 10, 30, 0).unwrap(),
/// )
/// .with_brand("Cargill")
/// .with_unit("tons");
///
/// let a = LocationId::from("WH_A12345");
/// let b = LocationId::from("WH_B67890");
/// assert!(txn.is_outflow_for(&a));
/// assert!(txn.is_inflow_for(&b));
/// assert!(txn.is_bulk());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier of the exchange.
    pub id: String,
    /// Location the goods leave (the sentinel for a mint).
    pub source: LocationId,
    /// Location the goods arrive at (the sentinel for a burn).
    pub destination: LocationId,
    /// Who creates or licenses the item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Item category, e.g. "Wheat", "Steel", "Art".
    pub item_type: String,
    /// Commodity standard.
    pub standard: CommodityStandard,
    /// Quantity moved (unit count for serialized goods).
    pub quantity: Decimal,
    /// Unit of measure, e.g. "tons", "gallons", "pieces".
    pub unit: String,
    /// Total price paid for the whole quantity.
    pub total_price: Decimal,
    /// When the exchange happened.
    pub timestamp: DateTime<Utc>,
    /// Batch identifier for batched goods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    /// Serial numbers for serialized goods.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub serial_ids: Vec<String>,
}

impl Transaction {
    /// Default unit of measure when none is given.
    pub const DEFAULT_UNIT: &'static str = "units";

    /// Create a new fungible transaction.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<LocationId>,
        destination: impl Into<LocationId>,
        item_type: impl Into<String>,
        quantity: Decimal,
        total_price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            destination: destination.into(),
            brand: None,
            item_type: item_type.into(),
            standard: CommodityStandard::Fungible,
            quantity,
            unit: Self::DEFAULT_UNIT.to_string(),
            total_price,
            timestamp,
            batch_id: None,
            serial_ids: Vec::new(),
        }
    }

    /// Set the commodity standard.
    #[must_use]
    pub const fn with_standard(mut self, standard: CommodityStandard) -> Self {
        self.standard = standard;
        self
    }

    /// Set the brand/manufacturer.
    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Set the unit of measure.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Mark as a batched transaction for the given batch.
    #[must_use]
    pub fn with_batch(mut self, batch_id: impl Into<String>) -> Self {
        self.standard = CommodityStandard::Batched;
        self.batch_id = Some(batch_id.into());
        self
    }

    /// Mark as a serialized transaction carrying the given serial numbers.
    #[must_use]
    pub fn with_serials<I, S>(mut self, serials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.standard = CommodityStandard::Serialized;
        self.serial_ids = serials.into_iter().map(Into::into).collect();
        self
    }

    /// The commodity being moved.
    #[must_use]
    pub fn commodity(&self) -> Commodity {
        Commodity::new(self.standard, self.item_type.clone(), self.batch_id.clone())
    }

    /// The commodity key this transaction touches at `location`.
    #[must_use]
    pub fn key_at(&self, location: &LocationId) -> CommodityKey {
        CommodityKey::new(location, self.commodity())
    }

    /// Goods come in to `location` (a purchase for it).
    #[must_use]
    pub fn is_inflow_for(&self, location: &LocationId) -> bool {
        &self.destination == location
    }

    /// Goods leave `location` (a sale for it).
    #[must_use]
    pub fn is_outflow_for(&self, location: &LocationId) -> bool {
        &self.source == location
    }

    /// `location` is either endpoint.
    #[must_use]
    pub fn is_relevant_for(&self, location: &LocationId) -> bool {
        self.is_inflow_for(location) || self.is_outflow_for(location)
    }

    /// New stock entering the system.
    #[must_use]
    pub fn is_mint(&self) -> bool {
        self.source.is_sentinel()
    }

    /// Stock leaving the system.
    #[must_use]
    pub fn is_burn(&self) -> bool {
        self.destination.is_sentinel()
    }

    /// Source and destination are the same location.
    #[must_use]
    pub fn is_self_transfer(&self) -> bool {
        self.source == self.destination
    }

    /// Bulk commodity (wheat, oil, steel, ...).
    #[must_use]
    pub const fn is_bulk(&self) -> bool {
        self.standard.is_bulk()
    }

    /// Serialized commodity.
    #[must_use]
    pub const fn is_serialized(&self) -> bool {
        self.standard.is_serialized()
    }

    /// Batched commodity.
    #[must_use]
    pub const fn is_batched(&self) -> bool {
        self.standard.is_batched()
    }

    /// Price per unit of quantity.
    #[must_use]
    pub fn unit_price(&self) -> Option<Decimal> {
        if self.quantity.is_zero() {
            None
        } else {
            Some(self.total_price / self.quantity)
        }
    }
}

/// A transaction exactly as a data source delivers it.
///
/// Every value field is kept as text so that nothing is coerced before
/// validation: malformed numbers, timestamps or standards are reported by the
/// normalizer with the offending transaction id instead of being silently
/// rounded or dropped. Column names follow the exchange table layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Exchange identifier.
    #[serde(alias = "exchange_id")]
    pub id: String,
    /// Source location id.
    #[serde(alias = "from_warehouse")]
    pub source: String,
    /// Destination location id.
    #[serde(alias = "to_warehouse")]
    pub destination: String,
    /// Brand or manufacturer.
    #[serde(default, alias = "brand_manufacturer")]
    pub brand: Option<String>,
    /// Item category.
    pub item_type: String,
    /// Commodity standard as text.
    #[serde(alias = "commodity_standard")]
    pub standard: String,
    /// Quantity as text.
    pub quantity: String,
    /// Unit of measure.
    #[serde(default)]
    pub unit: Option<String>,
    /// Total price as text.
    #[serde(alias = "price_paid_usd")]
    pub total_price: String,
    /// Timestamp as text (RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`).
    pub timestamp: String,
    /// Batch identifier.
    #[serde(default)]
    pub batch_id: Option<String>,
    /// `;`-separated serial numbers.
    #[serde(default, alias = "item_ids")]
    pub serial_ids: Option<String>,
}

impl TransactionRecord {
    /// Whether `location` is either endpoint of the raw record.
    #[must_use]
    pub fn touches(&self, location: &str) -> bool {
        self.source.trim() == location || self.destination.trim() == location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_inflow_outflow() {
        let txn = Transaction::new("EX_001", "WH_OTHER", "WH_TEST_123", "Wheat", dec!(100), dec!(10000), ts(1));
        let test = LocationId::from("WH_TEST_123");
        let other = LocationId::from("WH_OTHER");
        let unrelated = LocationId::from("WH_ELSEWHERE");

        assert!(txn.is_inflow_for(&test));
        assert!(!txn.is_outflow_for(&test));
        assert!(txn.is_relevant_for(&test));
        assert!(txn.is_outflow_for(&other));
        assert!(!txn.is_relevant_for(&unrelated));
        assert!(txn.is_bulk());
    }

    #[test]
    fn test_mint_and_burn() {
        let mint = Transaction::new("M", LocationId::SENTINEL, "WH_A", "Steel", dec!(5), dec!(1), ts(1));
        let burn = Transaction::new("B", "WH_A", LocationId::SENTINEL, "Steel", dec!(5), dec!(0), ts(2));
        assert!(mint.is_mint());
        assert!(!mint.is_burn());
        assert!(burn.is_burn());
        assert!(!burn.is_mint());
    }

    #[test]
    fn test_commodity_of_batched() {
        let txn = Transaction::new("EX", "A", "B", "Wine", dec!(12), dec!(600), ts(3)).with_batch("B-7");
        assert!(txn.is_batched());
        assert_eq!(txn.commodity(), Commodity::batched("Wine", "B-7"));
        assert_eq!(txn.key_at(&LocationId::from("A")).location, "A");
    }

    #[test]
    fn test_with_serials() {
        let txn = Transaction::new("EX", "A", "B", "Ferrari", dec!(2), dec!(500000), ts(3))
            .with_serials(["VIN1", "VIN2"]);
        assert!(txn.is_serialized());
        assert_eq!(txn.serial_ids.len(), 2);
    }

    #[test]
    fn test_unit_price() {
        let txn = Transaction::new("EX", "A", "B", "Wheat", dec!(100), dec!(20000), ts(1));
        assert_eq!(txn.unit_price(), Some(dec!(200)));
    }

    #[test]
    fn test_record_touches() {
        let record = TransactionRecord {
            source: " WH_A".to_string(),
            destination: "WH_B".to_string(),
            ..TransactionRecord::default()
        };
        assert!(record.touches("WH_A"));
        assert!(record.touches("WH_B"));
        assert!(!record.touches("WH_C"));
    }
}
