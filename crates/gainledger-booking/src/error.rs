//! Errors raised while computing gains.

use gainledger_core::{LocationId, ValidationError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while booking transactions or assembling reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GainsError {
    /// A transaction record failed validation; the whole batch is rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A purchase reached a ledger with a non-positive quantity or cost.
    #[error("invalid purchase {transaction_id}: quantity {quantity} and cost {cost} must both be positive")]
    InvalidPurchase {
        /// The offending transaction.
        transaction_id: String,
        /// Quantity of the purchase.
        quantity: Decimal,
        /// Total cost of the purchase.
        cost: Decimal,
    },

    /// A sale reached a ledger with a non-positive quantity or negative proceeds.
    #[error("invalid sale {transaction_id}: quantity {quantity} must be positive and proceeds {proceeds} non-negative")]
    InvalidSale {
        /// The offending transaction.
        transaction_id: String,
        /// Quantity of the sale.
        quantity: Decimal,
        /// Proceeds of the sale.
        proceeds: Decimal,
    },

    /// Strict mode only: a disposal exceeds the inventory held.
    #[error("unmatched disposal {transaction_id}: requested {requested}, available {available}")]
    UnmatchedSale {
        /// The offending transaction.
        transaction_id: String,
        /// Quantity requested.
        requested: Decimal,
        /// Quantity available in the ledger.
        available: Decimal,
    },

    /// A derived cost or proceeds share does not fit in a `Decimal`.
    #[error("arithmetic overflow while booking {transaction_id}")]
    Overflow {
        /// The transaction being booked.
        transaction_id: String,
    },

    /// The entity owns no resolvable locations.
    #[error("entity {entity_id} not found or has no locations")]
    EntityNotFound {
        /// The entity that could not be resolved.
        entity_id: String,
    },

    /// The location cannot be analysed (e.g. the mint/burn sentinel).
    #[error("location {location} cannot be analysed")]
    InvalidLocation {
        /// The rejected location.
        location: LocationId,
    },
}

impl GainsError {
    /// Id of the transaction that caused the error, when there is one.
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            Self::Validation(e) => Some(e.transaction_id()),
            Self::InvalidPurchase { transaction_id, .. }
            | Self::InvalidSale { transaction_id, .. }
            | Self::UnmatchedSale { transaction_id, .. }
            | Self::Overflow { transaction_id, .. } => Some(transaction_id),
            Self::EntityNotFound { .. } | Self::InvalidLocation { .. } => None,
        }
    }
}

/// Result type for booking operations.
pub type Result<T> = std::result::Result<T, GainsError>;
