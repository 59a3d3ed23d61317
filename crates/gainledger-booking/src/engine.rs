//! Routing of transactions into ledgers and fork-join evaluation.
//!
//! Both the location calculator and the entity consolidator reduce their
//! input to a list of [`Movement`]s. Movements are grouped by commodity and
//! every group is evaluated as one independent task: a group only ever
//! touches the ledgers of its own commodity, so groups share no state.
//! Cost-basis carrying transfers link the keys of one commodity across
//! locations, which is why the task is the commodity rather than the key.

use chrono::{DateTime, Utc};
use gainledger_core::{Commodity, CommodityKey, DateRange, LocationId, Transaction};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::GainsError;
use crate::ledger::CommodityLedger;
use crate::options::OversellPolicy;

/// Where a transaction lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    /// Purchase at the location.
    Inflow(LocationId),
    /// Sale at the location.
    Outflow(LocationId),
    /// Internal move carrying cost basis between two locations.
    Transfer { from: LocationId, to: LocationId },
}

#[derive(Debug, Clone)]
pub(crate) struct Movement<'a> {
    pub route: Route,
    pub txn: &'a Transaction,
}

impl<'a> Movement<'a> {
    pub const fn new(route: Route, txn: &'a Transaction) -> Self {
        Self { route, txn }
    }
}

/// Ledger plus cash-flow bookkeeping for one commodity key.
#[derive(Debug, Clone)]
pub(crate) struct KeyAccount {
    pub ledger: CommodityLedger,
    pub inflow_cost: Decimal,
    pub outflow_value: Decimal,
    pub transactions: usize,
    pub transfers: usize,
    pub period: Option<DateRange>,
    pub failure: Option<GainsError>,
}

impl KeyAccount {
    fn new(policy: OversellPolicy) -> Self {
        Self {
            ledger: CommodityLedger::with_policy(policy),
            inflow_cost: Decimal::ZERO,
            outflow_value: Decimal::ZERO,
            transactions: 0,
            transfers: 0,
            period: None,
            failure: None,
        }
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        let seen = DateRange { start: at, end: at };
        self.period = Some(self.period.map_or(seen, |p| p.union(seen)));
    }

    const fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

type Accounts = BTreeMap<LocationId, KeyAccount>;

fn account<'a>(accounts: &'a mut Accounts, location: &LocationId, policy: OversellPolicy) -> &'a mut KeyAccount {
    accounts
        .entry(location.clone())
        .or_insert_with(|| KeyAccount::new(policy))
}

fn fail(acct: &mut KeyAccount, commodity: &Commodity, location: &LocationId, error: GainsError) {
    warn!(
        key = %commodity.at(location),
        %error,
        "ledger failed, key excluded from totals"
    );
    acct.failure = Some(error);
}

/// Apply one movement to the accounts of its commodity.
fn apply(accounts: &mut Accounts, commodity: &Commodity, movement: &Movement<'_>, policy: OversellPolicy) {
    let txn = movement.txn;
    match &movement.route {
        Route::Inflow(location) => {
            let acct = account(accounts, location, policy);
            acct.touch(txn.timestamp);
            if acct.is_failed() {
                return;
            }
            acct.transactions += 1;
            acct.inflow_cost += txn.total_price;
            if let Err(e) = acct
                .ledger
                .add_purchase(&txn.id, txn.timestamp, txn.quantity, txn.total_price)
            {
                fail(acct, commodity, location, e);
            }
        }
        Route::Outflow(location) => {
            let acct = account(accounts, location, policy);
            acct.touch(txn.timestamp);
            if acct.is_failed() {
                return;
            }
            acct.transactions += 1;
            acct.outflow_value += txn.total_price;
            if let Err(e) = acct
                .ledger
                .process_sale(&txn.id, txn.timestamp, txn.quantity, txn.total_price)
            {
                fail(acct, commodity, location, e);
            }
        }
        Route::Transfer { from, to } => {
            let sender = account(accounts, from, policy);
            sender.touch(txn.timestamp);
            sender.transfers += 1;
            let slices = if sender.is_failed() {
                Vec::new()
            } else {
                match sender.ledger.transfer_out(&txn.id, txn.quantity) {
                    Ok(outcome) => outcome.moved,
                    Err(e) => {
                        fail(sender, commodity, from, e);
                        Vec::new()
                    }
                }
            };

            let receiver = account(accounts, to, policy);
            receiver.touch(txn.timestamp);
            receiver.transfers += 1;
            if !receiver.is_failed() {
                receiver.ledger.receive_transfer(&txn.id, txn.timestamp, &slices);
            }
        }
    }
}

/// Run every commodity's movements through fresh ledgers.
///
/// Movements must already be in processing order; grouping keeps the
/// relative order within each commodity.
pub(crate) fn evaluate(
    movements: Vec<Movement<'_>>,
    policy: OversellPolicy,
    parallel: bool,
) -> BTreeMap<CommodityKey, KeyAccount> {
    let mut groups: BTreeMap<Commodity, Vec<Movement<'_>>> = BTreeMap::new();
    for movement in movements {
        groups
            .entry(movement.txn.commodity())
            .or_default()
            .push(movement);
    }

    let run = |(commodity, moves): (Commodity, Vec<Movement<'_>>)| {
        let mut accounts = Accounts::new();
        for movement in &moves {
            apply(&mut accounts, &commodity, movement, policy);
        }
        accounts
            .into_iter()
            .map(|(location, acct)| (commodity.at(location), acct))
            .collect::<Vec<_>>()
    };

    let results: Vec<Vec<(CommodityKey, KeyAccount)>> = if parallel {
        groups.into_par_iter().map(run).collect()
    } else {
        groups.into_iter().map(run).collect()
    };

    results.into_iter().flatten().collect()
}
