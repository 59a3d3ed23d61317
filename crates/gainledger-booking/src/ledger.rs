//! FIFO commodity ledger.
//!
//! A [`CommodityLedger`] holds the inventory lots of exactly one commodity
//! key and matches disposals against them oldest first. Every (sale, lot)
//! pairing produces one immutable [`Allocation`] with its realized gain.
//!
//! Costs are never stored per unit. A lot keeps its original quantity, its
//! total cost and the cost still open. A partial disposal takes the pro-rata
//! share of the total cost, kept to [`COST_SCALE`] decimal places; the
//! disposal that empties the lot takes whatever cost is still open. The
//! allocations drawn from a lot therefore add up to exactly its total cost.
//! Proceeds shares use the same scale, with the residual on the last one.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GainsError, Result};
use crate::options::OversellPolicy;

/// Decimal places kept for derived costs and proceeds shares.
pub const COST_SCALE: u32 = 10;

/// `amount * part / whole` at [`COST_SCALE`], or `None` when the result
/// does not fit in a `Decimal`.
///
/// The product is formed first when it fits; otherwise the division goes
/// first, which only loses digits far below the kept scale.
fn pro_rata(amount: Decimal, part: Decimal, whole: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(part)
        .and_then(|p| p.checked_div(whole))
        .or_else(|| amount.checked_div(whole).and_then(|u| u.checked_mul(part)))
        .map(|v| v.round_dp(COST_SCALE))
}

fn overflow(transaction_id: &str) -> GainsError {
    GainsError::Overflow {
        transaction_id: transaction_id.to_string(),
    }
}

/// One acquisition held in a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Transaction that created the lot.
    pub transaction_id: String,
    /// When the lot was acquired at this location.
    pub acquired_at: DateTime<Utc>,
    /// Quantity originally acquired.
    pub quantity: Decimal,
    /// Total cost of the original quantity.
    pub total_cost: Decimal,
    /// Quantity not yet disposed of.
    pub remaining: Decimal,
    /// Part of `total_cost` not yet taken by a disposal.
    pub open_cost: Decimal,
}

impl Lot {
    fn new(
        transaction_id: impl Into<String>,
        acquired_at: DateTime<Utc>,
        quantity: Decimal,
        total_cost: Decimal,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            acquired_at,
            quantity,
            total_cost,
            remaining: quantity,
            open_cost: total_cost,
        }
    }

    /// Cost per unit, derived from total cost and original quantity.
    /// `None` when the quotient does not fit in a `Decimal`.
    #[must_use]
    pub fn unit_cost(&self) -> Option<Decimal> {
        self.total_cost.checked_div(self.quantity)
    }

    /// Cost attributed to the remaining quantity.
    #[must_use]
    pub const fn remaining_cost(&self) -> Decimal {
        self.open_cost
    }

    /// Check if nothing remains.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Cost of taking `quantity` (at most `remaining`) from this lot.
    fn cost_of(&self, quantity: Decimal) -> Option<Decimal> {
        if quantity >= self.remaining {
            return Some(self.open_cost);
        }
        pro_rata(self.total_cost, quantity, self.quantity).map(|c| c.min(self.open_cost))
    }
}

/// A pending removal from the lot at `index`.
struct Take {
    index: usize,
    quantity: Decimal,
    cost: Decimal,
}

/// Part of one lot consumed by a disposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotSlice {
    /// Transaction that created the source lot.
    pub lot_id: String,
    /// When the source lot was acquired.
    pub acquired_at: DateTime<Utc>,
    /// Quantity taken.
    pub quantity: Decimal,
    /// Cost carried by the quantity taken.
    pub cost: Decimal,
}

/// The matching of part of a sale to part of a lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Sale transaction.
    pub sale_id: String,
    /// Transaction that created the lot.
    pub lot_id: String,
    /// When the sale happened.
    pub sold_at: DateTime<Utc>,
    /// When the lot was acquired.
    pub acquired_at: DateTime<Utc>,
    /// Quantity matched.
    pub quantity: Decimal,
    /// Cost of the matched quantity.
    pub cost_basis: Decimal,
    /// Share of the sale proceeds for the matched quantity.
    pub proceeds: Decimal,
    /// `proceeds - cost_basis`.
    pub realized_gain: Decimal,
}

impl Allocation {
    /// Time the matched units were held.
    #[must_use]
    pub fn holding_period(&self) -> Duration {
        self.sold_at - self.acquired_at
    }
}

/// Result of processing one sale: a success that may carry an unmatched
/// remainder as a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOutcome {
    /// Sale transaction.
    pub transaction_id: String,
    /// Quantity the sale asked for.
    pub requested: Decimal,
    /// Quantity matched against lots.
    pub matched: Decimal,
    /// Quantity with no lot to match; excluded from gain accounting.
    pub unmatched: Decimal,
    /// Proceeds attributed to the matched quantity.
    pub matched_proceeds: Decimal,
    /// Cost basis of the matched quantity.
    pub cost_basis: Decimal,
    /// Realized gain of this sale.
    pub realized_gain: Decimal,
    /// One allocation per lot touched, oldest lot first.
    pub allocations: Vec<Allocation>,
}

impl SaleOutcome {
    /// Every unit of the sale was matched.
    #[must_use]
    pub fn is_fully_matched(&self) -> bool {
        self.unmatched.is_zero()
    }
}

/// Result of moving inventory out of a ledger without a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Transfer transaction.
    pub transaction_id: String,
    /// Quantity the transfer asked for.
    pub requested: Decimal,
    /// Lot slices removed, oldest first.
    pub moved: Vec<LotSlice>,
    /// Quantity with no lot to move.
    pub unmatched: Decimal,
}

impl TransferOutcome {
    /// Total quantity moved.
    #[must_use]
    pub fn moved_quantity(&self) -> Decimal {
        self.moved.iter().map(|s| s.quantity).sum()
    }

    /// Total cost carried by the moved slices.
    #[must_use]
    pub fn moved_cost(&self) -> Decimal {
        self.moved.iter().map(|s| s.cost).sum()
    }
}

/// FIFO state for one commodity key.
///
/// # Examples
///
/// ```
/// use gainledger_booking::CommodityLedger;
/// use chrono::{TimeZone, Utc};
/// use rust_decimal_macros::dec;
///
/// let mut ledger = CommodityLedger::new();
/// let jan = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
/// let mar = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
/// let may = Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap();
///
/// ledger.add_purchase("P1", jan, dec!(100), dec!(20000)).unwrap();
/// ledger.add_purchase("P2", mar, dec!(100), dec!(30000)).unwrap();
///
/// let outcome = ledger.process_sale("S1", may, dec!(150), dec!(37500)).unwrap();
/// assert_eq!(outcome.cost_basis, dec!(35000));
/// assert_eq!(outcome.realized_gain, dec!(2500));
/// assert_eq!(ledger.remaining_quantity(), dec!(50));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommodityLedger {
    lots: Vec<Lot>,
    allocations: Vec<Allocation>,
    policy: OversellPolicy,
    realized_gain: Decimal,
    acquired: Decimal,
    sold: Decimal,
    transferred_out: Decimal,
    unmatched: Decimal,
}

impl CommodityLedger {
    /// Create an empty ledger with the lenient oversell policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty ledger with the given oversell policy.
    #[must_use]
    pub fn with_policy(policy: OversellPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The oversell policy in force.
    #[must_use]
    pub const fn policy(&self) -> OversellPolicy {
        self.policy
    }

    /// Open lots, oldest first.
    #[must_use]
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Every allocation produced so far, in processing order.
    #[must_use]
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// No open lots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Record a purchase as a new lot.
    pub fn add_purchase(
        &mut self,
        transaction_id: &str,
        acquired_at: DateTime<Utc>,
        quantity: Decimal,
        total_cost: Decimal,
    ) -> Result<()> {
        if quantity <= Decimal::ZERO || total_cost <= Decimal::ZERO {
            return Err(GainsError::InvalidPurchase {
                transaction_id: transaction_id.to_string(),
                quantity,
                cost: total_cost,
            });
        }

        debug!(transaction = transaction_id, %quantity, cost = %total_cost, "lot added");
        self.insert_lot(Lot::new(transaction_id, acquired_at, quantity, total_cost));
        Ok(())
    }

    /// Match a sale against the oldest lots.
    ///
    /// Proceeds are shared between allocations in proportion to quantity:
    /// `proceeds_i = qty_i / quantity * proceeds`. When the sale is fully
    /// matched the last allocation takes the residual so the shares add up
    /// to `proceeds` exactly.
    ///
    /// Under [`OversellPolicy::Lenient`] a quantity beyond the lots on hand
    /// is reported as unmatched and contributes nothing. Under
    /// [`OversellPolicy::Strict`] it fails and the ledger is left untouched.
    pub fn process_sale(
        &mut self,
        transaction_id: &str,
        sold_at: DateTime<Utc>,
        quantity: Decimal,
        proceeds: Decimal,
    ) -> Result<SaleOutcome> {
        if quantity <= Decimal::ZERO || proceeds < Decimal::ZERO {
            return Err(GainsError::InvalidSale {
                transaction_id: transaction_id.to_string(),
                quantity,
                proceeds,
            });
        }
        self.check_available(transaction_id, quantity)?;

        let takes = self.plan(transaction_id, quantity)?;
        let matched: Decimal = takes.iter().map(|t| t.quantity).sum();
        let unmatched = quantity - matched;
        let matched_proceeds = if unmatched.is_zero() {
            proceeds
        } else {
            pro_rata(proceeds, matched, quantity).ok_or_else(|| overflow(transaction_id))?
        };

        let last = takes.len().saturating_sub(1);
        let mut assigned = Decimal::ZERO;
        let mut shares = Vec::with_capacity(takes.len());
        for (i, take) in takes.iter().enumerate() {
            let share = if i == last {
                matched_proceeds - assigned
            } else {
                pro_rata(proceeds, take.quantity, quantity).ok_or_else(|| overflow(transaction_id))?
            };
            assigned += share;
            shares.push(share);
        }

        let allocations: Vec<Allocation> = self
            .commit(takes)
            .into_iter()
            .zip(shares)
            .map(|(slice, share)| Allocation {
                sale_id: transaction_id.to_string(),
                lot_id: slice.lot_id,
                sold_at,
                acquired_at: slice.acquired_at,
                quantity: slice.quantity,
                cost_basis: slice.cost,
                proceeds: share,
                realized_gain: share - slice.cost,
            })
            .collect();

        let cost_basis: Decimal = allocations.iter().map(|a| a.cost_basis).sum();
        let realized_gain: Decimal = allocations.iter().map(|a| a.realized_gain).sum();

        self.sold += matched;
        self.unmatched += unmatched;
        self.realized_gain += realized_gain;
        self.allocations.extend(allocations.iter().cloned());

        if unmatched.is_zero() {
            debug!(transaction = transaction_id, %matched, gain = %realized_gain, "sale matched");
        } else {
            warn!(
                transaction = transaction_id,
                requested = %quantity,
                %unmatched,
                "sale exceeds known inventory, remainder excluded from cost basis"
            );
        }

        Ok(SaleOutcome {
            transaction_id: transaction_id.to_string(),
            requested: quantity,
            matched,
            unmatched,
            matched_proceeds,
            cost_basis,
            realized_gain,
            allocations,
        })
    }

    /// Move inventory out without realizing a gain, oldest lots first.
    ///
    /// The returned slices carry their share of cost and can be handed to
    /// [`CommodityLedger::receive_transfer`] on another ledger. The oversell
    /// policy applies as for sales.
    pub fn transfer_out(
        &mut self,
        transaction_id: &str,
        quantity: Decimal,
    ) -> Result<TransferOutcome> {
        if quantity <= Decimal::ZERO {
            return Err(GainsError::InvalidSale {
                transaction_id: transaction_id.to_string(),
                quantity,
                proceeds: Decimal::ZERO,
            });
        }
        self.check_available(transaction_id, quantity)?;

        let takes = self.plan(transaction_id, quantity)?;
        let moved = self.commit(takes);
        let moved_quantity: Decimal = moved.iter().map(|s| s.quantity).sum();
        let unmatched = quantity - moved_quantity;
        self.transferred_out += moved_quantity;
        self.unmatched += unmatched;

        if !unmatched.is_zero() {
            warn!(
                transaction = transaction_id,
                requested = %quantity,
                %unmatched,
                "transfer exceeds known inventory, remainder has no cost basis"
            );
        }

        Ok(TransferOutcome {
            transaction_id: transaction_id.to_string(),
            requested: quantity,
            moved,
            unmatched,
        })
    }

    /// Receive slices moved out of another ledger as lots acquired at
    /// `received_at`, keeping their carried cost.
    pub fn receive_transfer(
        &mut self,
        transaction_id: &str,
        received_at: DateTime<Utc>,
        slices: &[LotSlice],
    ) {
        for slice in slices.iter().filter(|s| s.quantity > Decimal::ZERO) {
            self.insert_lot(Lot::new(
                transaction_id,
                received_at,
                slice.quantity,
                slice.cost,
            ));
        }
    }

    /// Sum of all allocations' gains to date.
    #[must_use]
    pub const fn total_realized_gain(&self) -> Decimal {
        self.realized_gain
    }

    /// Cost of the inventory still held.
    #[must_use]
    pub fn unsold_cost_basis(&self) -> Decimal {
        self.lots.iter().map(Lot::remaining_cost).sum()
    }

    /// Quantity still held.
    #[must_use]
    pub fn remaining_quantity(&self) -> Decimal {
        self.lots.iter().map(|l| l.remaining).sum()
    }

    /// Quantity disposed of with no lot to match, across sales and transfers.
    #[must_use]
    pub const fn unmatched_quantity(&self) -> Decimal {
        self.unmatched
    }

    /// Quantity ever added, by purchase or received transfer.
    #[must_use]
    pub const fn acquired_quantity(&self) -> Decimal {
        self.acquired
    }

    /// Quantity matched by sales.
    #[must_use]
    pub const fn sold_quantity(&self) -> Decimal {
        self.sold
    }

    /// Quantity moved out by transfers.
    #[must_use]
    pub const fn transferred_out_quantity(&self) -> Decimal {
        self.transferred_out
    }

    fn check_available(&self, transaction_id: &str, quantity: Decimal) -> Result<()> {
        if self.policy == OversellPolicy::Strict {
            let available = self.remaining_quantity();
            if available < quantity {
                return Err(GainsError::UnmatchedSale {
                    transaction_id: transaction_id.to_string(),
                    requested: quantity,
                    available,
                });
            }
        }
        Ok(())
    }

    fn insert_lot(&mut self, lot: Lot) {
        self.acquired += lot.quantity;
        let out_of_order = self
            .lots
            .last()
            .is_some_and(|last| last.acquired_at > lot.acquired_at);
        self.lots.push(lot);
        if out_of_order {
            // Stable: lots with equal timestamps keep insertion order
            self.lots.sort_by_key(|l| l.acquired_at);
        }
    }

    /// Work out what taking up to `quantity` from the oldest lots would
    /// remove, without touching the lots.
    fn plan(&self, transaction_id: &str, quantity: Decimal) -> Result<Vec<Take>> {
        let mut wanted = quantity;
        let mut takes = Vec::new();

        for (index, lot) in self.lots.iter().enumerate() {
            if wanted.is_zero() {
                break;
            }
            let take = wanted.min(lot.remaining);
            if take.is_zero() {
                continue;
            }
            let cost = lot.cost_of(take).ok_or_else(|| overflow(transaction_id))?;
            takes.push(Take {
                index,
                quantity: take,
                cost,
            });
            wanted -= take;
        }
        Ok(takes)
    }

    /// Apply planned takes and drop exhausted lots.
    fn commit(&mut self, takes: Vec<Take>) -> Vec<LotSlice> {
        let slices: Vec<LotSlice> = takes
            .into_iter()
            .map(|take| {
                let lot = &mut self.lots[take.index];
                lot.remaining -= take.quantity;
                lot.open_cost -= take.cost;
                LotSlice {
                    lot_id: lot.transaction_id.clone(),
                    acquired_at: lot.acquired_at,
                    quantity: take.quantity,
                    cost: take.cost,
                }
            })
            .collect();

        self.lots.retain(|l| !l.is_exhausted());
        slices
    }
}
