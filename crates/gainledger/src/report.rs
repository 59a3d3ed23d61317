//! Text rendering of gain reports.

use gainledger_booking::{CommodityActivity, EntityGainReport, KeyFailure, LocationGainReport};
use gainledger_core::{CommodityStandard, DateRange};
use rust_decimal::Decimal;
use std::io::{self, Write};

fn money(value: Decimal) -> String {
    let value = value.round_dp(2);
    if value.is_sign_negative() && !value.is_zero() {
        format!("-${:.2}", value.abs())
    } else {
        format!("${value:.2}")
    }
}

fn period(range: Option<&DateRange>) -> String {
    range.map_or_else(
        || "no transactions".to_string(),
        |r| format!("{} to {}", r.start.format("%Y-%m-%d %H:%M:%S"), r.end.format("%Y-%m-%d %H:%M:%S")),
    )
}

fn write_failures<W: Write>(failures: &[&KeyFailure], writer: &mut W) -> io::Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    writeln!(writer)?;
    writeln!(writer, "Failed keys (excluded from totals):")?;
    for failure in failures {
        writeln!(writer, "  {}: {}", failure.key, failure.message)?;
    }
    Ok(())
}

/// Write a location report as text.
pub fn write_location_report<W: Write>(report: &LocationGainReport, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "Location Gains: {}", report.location)?;
    writeln!(writer, "{}", "=".repeat(40))?;
    writeln!(writer)?;
    writeln!(writer, "Reporter:      {}", report.reporter)?;
    writeln!(writer, "Analyzed at:   {}", report.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(writer, "Period:        {}", period(report.period.as_ref()))?;
    writeln!(writer)?;
    writeln!(writer, "Transactions:        {:>14}", report.transaction_count)?;
    writeln!(writer, "Total inflow cost:   {:>14}", money(report.total_inflow_cost))?;
    writeln!(writer, "Total outflow value: {:>14}", money(report.total_outflow_value))?;
    writeln!(writer, "Net cash flow:       {:>14}", money(report.net_cash_flow()))?;
    writeln!(writer, "Realized gain:       {:>14}", money(report.total_realized_gain))?;
    writeln!(writer, "Unsold cost basis:   {:>14}", money(report.unsold_cost_basis))?;
    if !report.unmatched_quantity.is_zero() {
        writeln!(writer, "Unmatched quantity:  {:>14}", report.unmatched_quantity)?;
    }

    writeln!(writer)?;
    writeln!(writer, "By standard:")?;
    for standard in CommodityStandard::ALL {
        let summary = report.standard(standard);
        writeln!(
            writer,
            "  {:<12} {:>4} txns  gain {:>14}",
            standard.to_string(),
            summary.transaction_count,
            money(summary.realized_gain)
        )?;
    }

    if !report.breakdown.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "By commodity:")?;
        for row in &report.breakdown {
            writeln!(
                writer,
                "  {:<32} {:>4} txns  gain {:>14}  held {} ({})",
                row.key.commodity.to_string(),
                row.transaction_count,
                money(row.realized_gain),
                row.remaining_quantity,
                money(row.unsold_cost_basis)
            )?;
            if !row.unmatched_quantity.is_zero() {
                writeln!(writer, "  {:<32} unmatched {}", "", row.unmatched_quantity)?;
            }
        }
    }

    let failures: Vec<&KeyFailure> = report.failures.iter().collect();
    write_failures(&failures, writer)
}

fn activity(top: Option<&CommodityActivity>) -> String {
    top.map_or_else(
        || "none".to_string(),
        |a| format!("{} ({} txns)", a.commodity, a.transaction_count),
    )
}

/// Write an entity report as text.
pub fn write_entity_report<W: Write>(report: &EntityGainReport, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "Entity Gains: {} ({})", report.entity_name, report.entity_id)?;
    writeln!(writer, "{}", "=".repeat(40))?;
    writeln!(writer)?;
    writeln!(writer, "Reporter:        {}", report.reporter)?;
    writeln!(writer, "Analyzed at:     {}", report.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(writer, "Period:          {}", period(report.period.as_ref()))?;
    writeln!(writer, "Transfer policy: {}", report.transfer_policy)?;
    writeln!(writer)?;
    writeln!(writer, "External transactions:   {:>14}", report.transaction_count)?;
    writeln!(writer, "External inflow cost:    {:>14}", money(report.total_inflow_cost))?;
    writeln!(writer, "External outflow value:  {:>14}", money(report.total_outflow_value))?;
    writeln!(writer, "Realized gain:           {:>14}", money(report.total_realized_gain))?;
    writeln!(writer, "Unsold cost basis:       {:>14}", money(report.unsold_cost_basis))?;
    writeln!(writer, "Internal transfers:      {:>14}", report.internal_transfer_count)?;
    writeln!(writer, "Internal transfer value: {:>14}", money(report.internal_transfer_value))?;
    if !report.unmatched_quantity.is_zero() {
        writeln!(writer, "Unmatched quantity:      {:>14}", report.unmatched_quantity)?;
    }
    writeln!(writer)?;

    let name = |l: Option<&gainledger_core::LocationId>| l.map_or_else(|| "none".to_string(), ToString::to_string);
    writeln!(writer, "Best location:   {}", name(report.best_location.as_ref()))?;
    writeln!(writer, "Worst location:  {}", name(report.worst_location.as_ref()))?;
    writeln!(writer, "Most active:     {}", activity(report.most_active_commodity.as_ref()))?;

    writeln!(writer)?;
    writeln!(writer, "By location:")?;
    for location in &report.location_reports {
        writeln!(
            writer,
            "  {:<16} {:>4} txns  {:>3} transfers  gain {:>14}",
            location.location.to_string(),
            location.transaction_count,
            location.transfer_count,
            money(location.total_realized_gain)
        )?;
    }

    let failures: Vec<&KeyFailure> = report.failures().collect();
    write_failures(&failures, writer)
}
