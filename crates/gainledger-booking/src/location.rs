//! Per-location gains.

use gainledger_core::{order_transactions, LocationId, Transaction};
use tracing::{info, info_span};

use crate::engine::{self, Movement, Route};
use crate::error::{GainsError, Result};
use crate::options::AnalysisOptions;
use crate::report::LocationGainReport;

/// Computes realized gains for one location.
///
/// Every transaction where the location is the destination is a purchase,
/// every transaction where it is the source is a sale. Anything else is
/// ignored, so callers may pass a larger transaction set than needed.
///
/// # Examples
///
/// ```
/// use gainledger_booking::{AnalysisOptions, LocationGainsCalculator};
/// use gainledger_core::Transaction;
/// use chrono::{TimeZone, Utc};
/// use rust_decimal_macros::dec;
///
/// let txns = vec![
///     Transaction::new("EX1", "0x0000", "WH_A", "Wheat", dec!(100), dec!(20000),
///         Utc.with_ymd_and_hms(2023, 6, 1, 10, 0, 0).unwrap()),
///     Transaction::new("EX2", "WH_A", "WH_B", "Wheat", dec!(50), dec!(12000),
///         Utc.with_ymd_and_hms(2023, 6, 15, 14, 30, 0).unwrap()),
/// ];
///
/// let calc = LocationGainsCalculator::new("WH_A", AnalysisOptions::default());
/// let report = calc.analyze(&txns).unwrap();
/// assert_eq!(report.total_realized_gain, dec!(2000));
/// assert_eq!(report.transaction_count, 2);
/// assert_eq!(report.unsold_cost_basis, dec!(10000));
/// ```
#[derive(Debug, Clone)]
pub struct LocationGainsCalculator {
    location: LocationId,
    options: AnalysisOptions,
}

impl LocationGainsCalculator {
    /// Create a calculator for `location`.
    #[must_use]
    pub fn new(location: impl Into<LocationId>, options: AnalysisOptions) -> Self {
        Self {
            location: location.into(),
            options,
        }
    }

    /// The analysed location.
    #[must_use]
    pub const fn location(&self) -> &LocationId {
        &self.location
    }

    /// The options in force.
    #[must_use]
    pub const fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Validate, order and book `transactions`, then build the report.
    ///
    /// A single invalid record fails the whole call. Ledger failures are
    /// isolated per commodity key and listed in the report.
    pub fn analyze(&self, transactions: &[Transaction]) -> Result<LocationGainReport> {
        if self.location.is_sentinel() {
            return Err(GainsError::InvalidLocation {
                location: self.location.clone(),
            });
        }

        let _span = info_span!("location_gains", location = %self.location).entered();
        let ordered = order_transactions(transactions.to_vec())?;

        let movements: Vec<Movement<'_>> = ordered
            .iter()
            .filter_map(|txn| {
                let route = if txn.is_outflow_for(&self.location) {
                    Route::Outflow(self.location.clone())
                } else if txn.is_inflow_for(&self.location) {
                    Route::Inflow(self.location.clone())
                } else {
                    return None;
                };
                Some(Movement::new(route, txn))
            })
            .collect();

        let relevant = movements.len();
        let accounts = engine::evaluate(movements, self.options.oversell, self.options.parallel);
        let report = LocationGainReport::from_accounts(
            self.location.clone(),
            accounts,
            &self.options.reporter,
            self.options.analyzed_at(),
        );

        info!(
            transactions = relevant,
            keys = report.breakdown.len(),
            failures = report.failures.len(),
            gain = %report.total_realized_gain,
            "location analysed"
        );
        Ok(report)
    }
}
