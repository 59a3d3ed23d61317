//! Entity-level consolidation.
//!
//! An entity owns a set of locations. Moving goods between two of them is
//! not a trade and must not produce a gain, so every transaction touching
//! the entity is classified first:
//!
//! - **internal**: both endpoints owned; counted and summed separately and
//!   never booked as a purchase or a sale
//! - **external**: exactly one endpoint owned; booked at that location
//!
//! What an internal transfer does to inventory is governed by
//! [`TransferPolicy`].

use gainledger_core::{order_transactions, Commodity, DateRange, Entity, LocationId, Transaction};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info, info_span};

use crate::engine::{self, Movement, Route};
use crate::error::{GainsError, Result};
use crate::options::{AnalysisOptions, TransferPolicy};
use crate::report::{most_active, rank_locations, EntityGainReport, LocationGainReport};

/// Which way goods move for the owned endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Goods arrive at the owned location.
    Inflow,
    /// Goods leave the owned location.
    Outflow,
}

/// How a transaction relates to an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Both endpoints are owned.
    Internal,
    /// Exactly one endpoint is owned.
    External {
        /// The owned endpoint.
        location: LocationId,
        /// Direction for the owned endpoint.
        direction: Direction,
    },
    /// Neither endpoint is owned.
    Unrelated,
}

impl Classification {
    /// Check if internal.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }

    /// Check if external.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }
}

/// Consolidates gains across the locations of one entity.
#[derive(Debug, Clone)]
pub struct EntityConsolidator {
    entity: Entity,
    options: AnalysisOptions,
}

impl EntityConsolidator {
    /// Create a consolidator. Fails if the entity owns no locations.
    pub fn new(entity: Entity, options: AnalysisOptions) -> Result<Self> {
        if entity.locations.is_empty() {
            return Err(GainsError::EntityNotFound {
                entity_id: entity.id,
            });
        }
        Ok(Self { entity, options })
    }

    /// The consolidated entity.
    #[must_use]
    pub const fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Classify one transaction against the entity's location set.
    #[must_use]
    pub fn classify(&self, txn: &Transaction) -> Classification {
        let from = self.entity.owns(&txn.source);
        let to = self.entity.owns(&txn.destination);
        match (from, to) {
            (true, true) => Classification::Internal,
            (true, false) => Classification::External {
                location: txn.source.clone(),
                direction: Direction::Outflow,
            },
            (false, true) => Classification::External {
                location: txn.destination.clone(),
                direction: Direction::Inflow,
            },
            (false, false) => Classification::Unrelated,
        }
    }

    /// Validate, order, classify and book `transactions`, then build the
    /// entity report with one location report per owned location.
    pub fn consolidate(&self, transactions: &[Transaction]) -> Result<EntityGainReport> {
        let _span = info_span!("entity_gains", entity = %self.entity.id).entered();
        let ordered = order_transactions(transactions.to_vec())?;
        let carry = self.options.transfers == TransferPolicy::CarryCostBasis;

        let mut movements = Vec::new();
        let mut internal_count = 0usize;
        let mut internal_value = Decimal::ZERO;
        let mut activity: BTreeMap<Commodity, usize> = BTreeMap::new();
        let mut period: Option<DateRange> = None;

        for txn in &ordered {
            let route = match self.classify(txn) {
                Classification::Unrelated => continue,
                Classification::Internal => {
                    internal_count += 1;
                    internal_value += txn.total_price;
                    debug!(transaction = %txn.id, from = %txn.source, to = %txn.destination, "internal transfer");
                    carry.then(|| Route::Transfer {
                        from: txn.source.clone(),
                        to: txn.destination.clone(),
                    })
                }
                Classification::External {
                    location,
                    direction: Direction::Inflow,
                } => Some(Route::Inflow(location)),
                Classification::External {
                    location,
                    direction: Direction::Outflow,
                } => Some(Route::Outflow(location)),
            };

            *activity.entry(txn.commodity()).or_default() += 1;
            let seen = DateRange {
                start: txn.timestamp,
                end: txn.timestamp,
            };
            period = Some(period.map_or(seen, |p| p.union(seen)));

            if let Some(route) = route {
                movements.push(Movement::new(route, txn));
            }
        }

        let accounts = engine::evaluate(movements, self.options.oversell, self.options.parallel);

        let mut by_location: BTreeMap<LocationId, Vec<_>> = self
            .entity
            .locations
            .iter()
            .map(|l| (l.clone(), Vec::new()))
            .collect();
        for (key, acct) in accounts {
            if let Some(bucket) = by_location.get_mut(&key.location) {
                bucket.push((key, acct));
            }
        }

        let analyzed_at = self.options.analyzed_at();
        let location_reports: Vec<LocationGainReport> = by_location
            .into_iter()
            .map(|(location, accounts)| {
                LocationGainReport::from_accounts(location, accounts, &self.options.reporter, analyzed_at)
            })
            .collect();

        let (best_location, worst_location) = rank_locations(&location_reports);
        let sum = |f: fn(&LocationGainReport) -> Decimal| location_reports.iter().map(f).sum::<Decimal>();

        let report = EntityGainReport {
            entity_id: self.entity.id.clone(),
            entity_name: self.entity.name.clone(),
            locations: self.entity.locations.iter().cloned().collect(),
            reporter: self.options.reporter.clone(),
            analyzed_at,
            period,
            transfer_policy: self.options.transfers,
            total_inflow_cost: sum(|r| r.total_inflow_cost),
            total_outflow_value: sum(|r| r.total_outflow_value),
            total_realized_gain: sum(|r| r.total_realized_gain),
            transaction_count: location_reports.iter().map(|r| r.transaction_count).sum(),
            internal_transfer_count: internal_count,
            internal_transfer_value: internal_value,
            unmatched_quantity: sum(|r| r.unmatched_quantity),
            unsold_cost_basis: sum(|r| r.unsold_cost_basis),
            most_active_commodity: most_active(&activity),
            best_location,
            worst_location,
            location_reports,
        };

        info!(
            locations = report.locations.len(),
            external = report.transaction_count,
            internal = report.internal_transfer_count,
            gain = %report.total_realized_gain,
            "entity consolidated"
        );
        Ok(report)
    }
}
