//! Transaction normalizer.
//!
//! Turns raw [`TransactionRecord`]s (or already-built [`Transaction`]s) into
//! a validated sequence in a total chronological order. The order is
//! timestamp ascending, then transaction id, then input position, so the
//! same set of records always comes out in the same order no matter how a
//! data source happened to return them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::{CommodityStandard, LocationId, Transaction, TransactionRecord};

/// A transaction record that cannot be accepted.
///
/// Every variant carries the offending transaction id. Validation is
/// all-or-nothing: one bad record fails the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field is empty.
    #[error("transaction {transaction_id:?}: missing {field}")]
    MissingField {
        /// The transaction id (may be empty when the id itself is missing).
        transaction_id: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A numeric or timestamp field could not be parsed.
    #[error("transaction {transaction_id}: malformed {field} '{value}'")]
    MalformedField {
        /// The transaction id.
        transaction_id: String,
        /// Name of the field.
        field: &'static str,
        /// The raw value.
        value: String,
    },

    /// The commodity standard is not one of fungible, serialized or batched.
    #[error("transaction {transaction_id}: unknown commodity standard '{value}'")]
    UnknownStandard {
        /// The transaction id.
        transaction_id: String,
        /// The raw value.
        value: String,
    },

    /// Quantity is zero or negative.
    #[error("transaction {transaction_id}: quantity must be positive, got {quantity}")]
    NonPositiveQuantity {
        /// The transaction id.
        transaction_id: String,
        /// The offending quantity.
        quantity: Decimal,
    },

    /// Price is negative.
    #[error("transaction {transaction_id}: price must not be negative, got {price}")]
    NegativePrice {
        /// The transaction id.
        transaction_id: String,
        /// The offending price.
        price: Decimal,
    },

    /// Source and destination are the same location.
    #[error("transaction {transaction_id}: source and destination are both {location}")]
    SelfTransfer {
        /// The transaction id.
        transaction_id: String,
        /// The location on both sides.
        location: LocationId,
    },

    /// Batched goods without a batch id.
    #[error("transaction {transaction_id}: batched goods require a batch id")]
    MissingBatchId {
        /// The transaction id.
        transaction_id: String,
    },

    /// Serialized goods counted in fractions.
    #[error("transaction {transaction_id}: serialized unit count must be whole, got {quantity}")]
    FractionalUnitCount {
        /// The transaction id.
        transaction_id: String,
        /// The offending quantity.
        quantity: Decimal,
    },

    /// Serial id list disagrees with the unit count.
    #[error("transaction {transaction_id}: {serials} serial ids for {quantity} units")]
    SerialCountMismatch {
        /// The transaction id.
        transaction_id: String,
        /// Number of serial ids supplied.
        serials: usize,
        /// Unit count of the transaction.
        quantity: Decimal,
    },
}

impl ValidationError {
    /// Id of the transaction that failed validation.
    #[must_use]
    pub fn transaction_id(&self) -> &str {
        match self {
            Self::MissingField { transaction_id, .. }
            | Self::MalformedField { transaction_id, .. }
            | Self::UnknownStandard { transaction_id, .. }
            | Self::NonPositiveQuantity { transaction_id, .. }
            | Self::NegativePrice { transaction_id, .. }
            | Self::SelfTransfer { transaction_id, .. }
            | Self::MissingBatchId { transaction_id }
            | Self::FractionalUnitCount { transaction_id, .. }
            | Self::SerialCountMismatch { transaction_id, .. } => transaction_id,
        }
    }
}

/// Convert raw records to canonical transactions in chronological order.
///
/// # Examples
///
/// ```
/// use gainledger_core::{normalize_records, TransactionRecord};
///
/// let record = TransactionRecord {
///     id: "EX001".into(),
///     source: "WH_A".into(),
///     destination: "WH_B".into(),
///     item_type: "Wheat".into(),
///     standard: "bulk".into(),
///     quantity: "100.5".into(),
///     total_price: "5025.00".into(),
///     timestamp: "2023-06-15T10:30:00Z".into(),
///     ..Default::default()
/// };
///
/// let txns = normalize_records(vec![record]).unwrap();
/// assert_eq!(txns[0].quantity.to_string(), "100.5");
/// ```
pub fn normalize_records(
    records: Vec<TransactionRecord>,
) -> Result<Vec<Transaction>, ValidationError> {
    let transactions = records
        .into_iter()
        .map(canonicalize)
        .collect::<Result<Vec<_>, _>>()?;
    order_transactions(transactions)
}

/// Validate canonical transactions and put them in chronological order.
pub fn order_transactions(
    mut transactions: Vec<Transaction>,
) -> Result<Vec<Transaction>, ValidationError> {
    for txn in &transactions {
        validate(txn)?;
    }
    // sort_by is stable: equal (timestamp, id) pairs keep their input order
    transactions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    Ok(transactions)
}

/// Parse a timestamp in RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]`
/// (naive values are taken as UTC) or `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn canonicalize(record: TransactionRecord) -> Result<Transaction, ValidationError> {
    let id = record.id.trim().to_string();
    let required = |value: &str, field: &'static str| {
        let value = value.trim();
        if value.is_empty() {
            Err(ValidationError::MissingField {
                transaction_id: id.clone(),
                field,
            })
        } else {
            Ok(value.to_string())
        }
    };

    required(&record.id, "id")?;
    let source = required(&record.source, "source")?;
    let destination = required(&record.destination, "destination")?;
    let item_type = required(&record.item_type, "item_type")?;

    let standard = CommodityStandard::from_str(&record.standard).map_err(|_| {
        ValidationError::UnknownStandard {
            transaction_id: id.clone(),
            value: record.standard.clone(),
        }
    })?;
    let quantity = parse_decimal(&id, "quantity", &record.quantity)?;
    let total_price = parse_decimal(&id, "total_price", &record.total_price)?;
    let timestamp =
        parse_timestamp(&record.timestamp).ok_or_else(|| ValidationError::MalformedField {
            transaction_id: id.clone(),
            field: "timestamp",
            value: record.timestamp.clone(),
        })?;

    let serial_ids = record
        .serial_ids
        .as_deref()
        .map(|s| {
            s.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Transaction {
        id: id.clone(),
        source: LocationId::new(source),
        destination: LocationId::new(destination),
        brand: non_empty(record.brand),
        item_type,
        standard,
        quantity,
        unit: non_empty(record.unit).unwrap_or_else(|| Transaction::DEFAULT_UNIT.to_string()),
        total_price,
        timestamp,
        batch_id: non_empty(record.batch_id),
        serial_ids,
    })
}

fn parse_decimal(id: &str, field: &'static str, value: &str) -> Result<Decimal, ValidationError> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ValidationError::MalformedField {
            transaction_id: id.to_string(),
            field,
            value: value.to_string(),
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate(txn: &Transaction) -> Result<(), ValidationError> {
    let transaction_id = || txn.id.clone();

    if txn.id.trim().is_empty() {
        return Err(ValidationError::MissingField {
            transaction_id: transaction_id(),
            field: "id",
        });
    }
    if txn.item_type.trim().is_empty() {
        return Err(ValidationError::MissingField {
            transaction_id: transaction_id(),
            field: "item_type",
        });
    }
    if txn.quantity <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveQuantity {
            transaction_id: transaction_id(),
            quantity: txn.quantity,
        });
    }
    if txn.total_price < Decimal::ZERO {
        return Err(ValidationError::NegativePrice {
            transaction_id: transaction_id(),
            price: txn.total_price,
        });
    }
    if txn.is_self_transfer() {
        return Err(ValidationError::SelfTransfer {
            transaction_id: transaction_id(),
            location: txn.source.clone(),
        });
    }

    match txn.standard {
        CommodityStandard::Fungible => {}
        CommodityStandard::Batched => {
            if txn.batch_id.as_deref().map_or(true, |b| b.trim().is_empty()) {
                return Err(ValidationError::MissingBatchId {
                    transaction_id: transaction_id(),
                });
            }
        }
        CommodityStandard::Serialized => {
            if !txn.quantity.fract().is_zero() {
                return Err(ValidationError::FractionalUnitCount {
                    transaction_id: transaction_id(),
                    quantity: txn.quantity,
                });
            }
            if !txn.serial_ids.is_empty() && Decimal::from(txn.serial_ids.len()) != txn.quantity {
                return Err(ValidationError::SerialCountMismatch {
                    transaction_id: transaction_id(),
                    serials: txn.serial_ids.len(),
                    quantity: txn.quantity,
                });
            }
        }
    }

    Ok(())
}
