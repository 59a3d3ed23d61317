//! Report model.
//!
//! Reports are built once at the end of an analysis run from the ledger
//! states and are read-only afterwards. Everything serializes with serde so
//! presentation layers can emit JSON directly.

use chrono::{DateTime, Utc};
use gainledger_core::{Commodity, CommodityKey, CommodityStandard, DateRange, LocationId};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::engine::KeyAccount;
use crate::ledger::Allocation;
use crate::options::TransferPolicy;

/// Sub-totals for one commodity standard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StandardSummary {
    /// Cost of purchases.
    pub inflow_cost: Decimal,
    /// Value of sales.
    pub outflow_value: Decimal,
    /// Realized gain.
    pub realized_gain: Decimal,
    /// Purchases plus sales.
    pub transaction_count: usize,
}

impl StandardSummary {
    fn add(&mut self, row: &KeyBreakdown) {
        self.inflow_cost += row.inflow_cost;
        self.outflow_value += row.outflow_value;
        self.realized_gain += row.realized_gain;
        self.transaction_count += row.transaction_count;
    }
}

/// Results for one commodity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyBreakdown {
    /// The key.
    pub key: CommodityKey,
    /// Cost of purchases.
    pub inflow_cost: Decimal,
    /// Value of sales.
    pub outflow_value: Decimal,
    /// Realized gain of the key's ledger.
    pub realized_gain: Decimal,
    /// Purchases plus sales.
    pub transaction_count: usize,
    /// Internal transfers in or out.
    pub transfer_count: usize,
    /// Quantity purchased or received.
    pub acquired_quantity: Decimal,
    /// Quantity matched by sales.
    pub sold_quantity: Decimal,
    /// Quantity moved out by internal transfers.
    pub transferred_out_quantity: Decimal,
    /// Quantity disposed of without a lot to match.
    pub unmatched_quantity: Decimal,
    /// Quantity still held.
    pub remaining_quantity: Decimal,
    /// Cost of the quantity still held.
    pub unsold_cost_basis: Decimal,
    /// Every (sale, lot) match in processing order.
    pub allocations: Vec<Allocation>,
}

/// A key whose ledger failed; it is excluded from all totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyFailure {
    /// The failed key.
    pub key: CommodityKey,
    /// Transaction that caused the failure.
    pub transaction_id: Option<String>,
    /// Error message.
    pub message: String,
}

/// Gains for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationGainReport {
    /// Analysed location.
    pub location: LocationId,
    /// Who ran the analysis.
    pub reporter: String,
    /// When the analysis ran.
    pub analyzed_at: DateTime<Utc>,
    /// First and last transaction seen, `None` without transactions.
    pub period: Option<DateRange>,
    /// Cost of all purchases.
    pub total_inflow_cost: Decimal,
    /// Value of all sales.
    pub total_outflow_value: Decimal,
    /// Sum of every ledger's realized gain.
    pub total_realized_gain: Decimal,
    /// Purchases plus sales.
    pub transaction_count: usize,
    /// Internal transfers in or out (entity runs only).
    pub transfer_count: usize,
    /// Quantity disposed of without a lot to match.
    pub unmatched_quantity: Decimal,
    /// Cost of inventory still held.
    pub unsold_cost_basis: Decimal,
    /// Sub-totals for every standard.
    pub by_standard: BTreeMap<CommodityStandard, StandardSummary>,
    /// One row per healthy commodity key, in key order.
    pub breakdown: Vec<KeyBreakdown>,
    /// Keys whose ledger failed.
    pub failures: Vec<KeyFailure>,
}

impl LocationGainReport {
    /// Assemble a report from the accounts of one location.
    pub(crate) fn from_accounts<I>(
        location: LocationId,
        accounts: I,
        reporter: &str,
        analyzed_at: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = (CommodityKey, KeyAccount)>,
    {
        let mut report = Self {
            location,
            reporter: reporter.to_string(),
            analyzed_at,
            period: None,
            total_inflow_cost: Decimal::ZERO,
            total_outflow_value: Decimal::ZERO,
            total_realized_gain: Decimal::ZERO,
            transaction_count: 0,
            transfer_count: 0,
            unmatched_quantity: Decimal::ZERO,
            unsold_cost_basis: Decimal::ZERO,
            by_standard: CommodityStandard::ALL
                .into_iter()
                .map(|s| (s, StandardSummary::default()))
                .collect(),
            breakdown: Vec::new(),
            failures: Vec::new(),
        };

        for (key, acct) in accounts {
            if let Some(seen) = acct.period {
                report.period = Some(report.period.map_or(seen, |p| p.union(seen)));
            }

            if let Some(error) = acct.failure {
                report.failures.push(KeyFailure {
                    key,
                    transaction_id: error.transaction_id().map(str::to_string),
                    message: error.to_string(),
                });
                continue;
            }

            let ledger = &acct.ledger;
            let row = KeyBreakdown {
                inflow_cost: acct.inflow_cost,
                outflow_value: acct.outflow_value,
                realized_gain: ledger.total_realized_gain(),
                transaction_count: acct.transactions,
                transfer_count: acct.transfers,
                acquired_quantity: ledger.acquired_quantity(),
                sold_quantity: ledger.sold_quantity(),
                transferred_out_quantity: ledger.transferred_out_quantity(),
                unmatched_quantity: ledger.unmatched_quantity(),
                remaining_quantity: ledger.remaining_quantity(),
                unsold_cost_basis: ledger.unsold_cost_basis(),
                allocations: ledger.allocations().to_vec(),
                key,
            };

            report.total_inflow_cost += row.inflow_cost;
            report.total_outflow_value += row.outflow_value;
            report.total_realized_gain += row.realized_gain;
            report.transaction_count += row.transaction_count;
            report.transfer_count += row.transfer_count;
            report.unmatched_quantity += row.unmatched_quantity;
            report.unsold_cost_basis += row.unsold_cost_basis;
            report
                .by_standard
                .entry(row.key.standard())
                .or_default()
                .add(&row);
            report.breakdown.push(row);
        }

        report
    }

    /// Outflow value minus inflow cost, ignoring inventory still held.
    #[must_use]
    pub fn net_cash_flow(&self) -> Decimal {
        self.total_outflow_value - self.total_inflow_cost
    }

    /// Sub-totals for `standard`.
    #[must_use]
    pub fn standard(&self, standard: CommodityStandard) -> StandardSummary {
        self.by_standard.get(&standard).copied().unwrap_or_default()
    }

    /// Sub-totals for bulk goods.
    #[must_use]
    pub fn bulk(&self) -> StandardSummary {
        self.standard(CommodityStandard::Fungible)
    }

    /// Sub-totals for serialized goods.
    #[must_use]
    pub fn serialized(&self) -> StandardSummary {
        self.standard(CommodityStandard::Serialized)
    }

    /// Breakdown row for a commodity, if it was traded here.
    #[must_use]
    pub fn key(&self, commodity: &Commodity) -> Option<&KeyBreakdown> {
        self.breakdown.iter().find(|row| &row.key.commodity == commodity)
    }

    /// No key failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// No transactions were booked here.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.transaction_count == 0 && self.transfer_count == 0
    }
}

/// Transaction count of the busiest commodity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommodityActivity {
    /// The commodity.
    pub commodity: Commodity,
    /// Transactions involving it, internal transfers included.
    pub transaction_count: usize,
}

/// Gains for an entity across its locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityGainReport {
    /// Entity id.
    pub entity_id: String,
    /// Entity display name.
    pub entity_name: String,
    /// Owned locations, sorted.
    pub locations: Vec<LocationId>,
    /// Who ran the analysis.
    pub reporter: String,
    /// When the analysis ran.
    pub analyzed_at: DateTime<Utc>,
    /// First and last transaction seen.
    pub period: Option<DateRange>,
    /// How internal transfers moved cost basis.
    pub transfer_policy: TransferPolicy,
    /// Cost of external purchases.
    pub total_inflow_cost: Decimal,
    /// Value of external sales.
    pub total_outflow_value: Decimal,
    /// Realized gain from external transactions.
    pub total_realized_gain: Decimal,
    /// External purchases plus sales.
    pub transaction_count: usize,
    /// Transfers between two owned locations.
    pub internal_transfer_count: usize,
    /// Total price recorded on internal transfers; never part of the gain.
    pub internal_transfer_value: Decimal,
    /// Quantity disposed of without a lot to match.
    pub unmatched_quantity: Decimal,
    /// Cost of inventory still held across all locations.
    pub unsold_cost_basis: Decimal,
    /// One report per owned location, in location order.
    pub location_reports: Vec<LocationGainReport>,
    /// Location with the highest realized gain.
    pub best_location: Option<LocationId>,
    /// Location with the lowest realized gain.
    pub worst_location: Option<LocationId>,
    /// Commodity with the most transactions.
    pub most_active_commodity: Option<CommodityActivity>,
}

impl EntityGainReport {
    /// Outflow value minus inflow cost of external transactions.
    #[must_use]
    pub fn net_cash_flow(&self) -> Decimal {
        self.total_outflow_value - self.total_inflow_cost
    }

    /// Report of one owned location.
    #[must_use]
    pub fn location(&self, location: &LocationId) -> Option<&LocationGainReport> {
        self.location_reports.iter().find(|r| &r.location == location)
    }

    /// Failed keys across all locations.
    pub fn failures(&self) -> impl Iterator<Item = &KeyFailure> {
        self.location_reports.iter().flat_map(|r| r.failures.iter())
    }

    /// Sub-totals for `standard` across all locations.
    #[must_use]
    pub fn standard(&self, standard: CommodityStandard) -> StandardSummary {
        self.location_reports
            .iter()
            .map(|r| r.standard(standard))
            .fold(StandardSummary::default(), |mut acc, s| {
                acc.inflow_cost += s.inflow_cost;
                acc.outflow_value += s.outflow_value;
                acc.realized_gain += s.realized_gain;
                acc.transaction_count += s.transaction_count;
                acc
            })
    }
}

/// Highest and lowest gain among active locations; ties go to the smaller id.
pub(crate) fn rank_locations(
    reports: &[LocationGainReport],
) -> (Option<LocationId>, Option<LocationId>) {
    let mut best: Option<&LocationGainReport> = None;
    let mut worst: Option<&LocationGainReport> = None;

    // Reports arrive in location order, so strict comparisons keep the
    // smallest id on ties.
    for report in reports.iter().filter(|r| r.transaction_count > 0) {
        if best.map_or(true, |b| report.total_realized_gain > b.total_realized_gain) {
            best = Some(report);
        }
        if worst.map_or(true, |w| report.total_realized_gain < w.total_realized_gain) {
            worst = Some(report);
        }
    }

    (
        best.map(|r| r.location.clone()),
        worst.map(|r| r.location.clone()),
    )
}

/// Busiest commodity; ties go to the smaller commodity.
pub(crate) fn most_active(counts: &BTreeMap<Commodity, usize>) -> Option<CommodityActivity> {
    let mut top: Option<(&Commodity, usize)> = None;
    for (commodity, &count) in counts {
        if top.map_or(true, |(_, best)| count > best) {
            top = Some((commodity, count));
        }
    }
    top.map(|(commodity, transaction_count)| CommodityActivity {
        commodity: commodity.clone(),
        transaction_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn report(location: &str, gain: Decimal, count: usize) -> LocationGainReport {
        let mut r = LocationGainReport::from_accounts(
            LocationId::from(location),
            Vec::<(CommodityKey, KeyAccount)>::new(),
            "tester",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        r.total_realized_gain = gain;
        r.transaction_count = count;
        r
    }

    #[test]
    fn test_empty_report_has_every_standard() {
        let r = report("WH_A", dec!(0), 0);
        assert_eq!(r.by_standard.len(), 3);
        assert_eq!(r.bulk(), StandardSummary::default());
        assert!(r.period.is_none());
        assert!(r.is_complete());
        assert!(r.is_idle());
    }

    #[test]
    fn test_rank_skips_idle_locations() {
        let reports = vec![
            report("WH_A", dec!(100), 2),
            report("WH_B", dec!(0), 0),
            report("WH_C", dec!(-50), 1),
        ];
        let (best, worst) = rank_locations(&reports);
        assert_eq!(best, Some(LocationId::from("WH_A")));
        assert_eq!(worst, Some(LocationId::from("WH_C")));
    }

    #[test]
    fn test_rank_ties_prefer_smaller_id() {
        let reports = vec![report("WH_A", dec!(10), 1), report("WH_B", dec!(10), 1)];
        let (best, worst) = rank_locations(&reports);
        assert_eq!(best, Some(LocationId::from("WH_A")));
        assert_eq!(worst, Some(LocationId::from("WH_A")));
    }

    #[test]
    fn test_rank_no_active_locations() {
        let reports = vec![report("WH_A", dec!(0), 0)];
        assert_eq!(rank_locations(&reports), (None, None));
    }

    #[test]
    fn test_most_active_ties() {
        let mut counts = BTreeMap::new();
        counts.insert(Commodity::fungible("Wheat"), 3);
        counts.insert(Commodity::fungible("Steel"), 3);
        counts.insert(Commodity::serialized("Car"), 1);

        let top = most_active(&counts).unwrap();
        assert_eq!(top.commodity, Commodity::fungible("Steel"));
        assert_eq!(top.transaction_count, 3);
        assert!(most_active(&BTreeMap::new()).is_none());
    }

    #[test]
    fn test_net_cash_flow() {
        let mut r = report("WH_A", dec!(0), 2);
        r.total_inflow_cost = dec!(20000);
        r.total_outflow_value = dec!(12000);
        assert_eq!(r.net_cash_flow(), dec!(-8000));
    }
}
