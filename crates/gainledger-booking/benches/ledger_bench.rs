//! Ledger and calculator performance benchmarks.
//!
//! Run with: cargo bench -p gainledger-booking

#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use chrono::{DateTime, Duration, TimeZone, Utc};
use gainledger_booking::{AnalysisOptions, CommodityLedger, EntityConsolidator, LocationGainsCalculator};
use gainledger_core::{Entity, Transaction};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn at(minutes: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes as i64)
}

/// Alternating purchases and smaller sales across `items` commodities.
fn generate_transactions(count: usize, items: usize) -> Vec<Transaction> {
    (0..count)
        .map(|i| {
            let item = format!("Item{}", i % items);
            if i % 3 == 2 {
                Transaction::new(format!("S{i}"), "WH_A", "WH_X", item, dec!(15), dec!(2000), at(i))
            } else {
                let cost = dec!(1000) + Decimal::from(i % 50);
                Transaction::new(format!("P{i}"), "0x0000", "WH_A", item, dec!(10), cost, at(i))
            }
        })
        .collect()
}

fn bench_ledger_sales(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_sales");

    for size in [10, 100, 1000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut ledger = CommodityLedger::new();
                for i in 0..size {
                    ledger
                        .add_purchase("P", at(i), dec!(10), dec!(100) + Decimal::from(i))
                        .unwrap();
                }
                // One sale draining every lot
                let qty = Decimal::from(size * 10);
                black_box(ledger.process_sale("S", at(size), qty, qty * dec!(12)).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_location_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("location_analyze");

    for size in [100, 1000, 10000] {
        let txns = generate_transactions(size, 16);
        group.throughput(Throughput::Elements(size as u64));

        for parallel in [false, true] {
            let calc = LocationGainsCalculator::new(
                "WH_A",
                AnalysisOptions::default().with_parallel(parallel),
            );
            let id = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(id, size), &txns, |b, txns| {
                b.iter(|| black_box(calc.analyze(txns).unwrap()));
            });
        }
    }

    group.finish();
}

fn bench_entity_consolidate(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_consolidate");
    let entity = Entity::new("E", "Bench").with_location("WH_A").with_location("WH_X");

    for size in [100, 1000, 10000] {
        let txns = generate_transactions(size, 16);
        let consolidator = EntityConsolidator::new(entity.clone(), AnalysisOptions::default()).unwrap();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &txns, |b, txns| {
            b.iter(|| black_box(consolidator.consolidate(txns).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ledger_sales,
    bench_location_analyze,
    bench_entity_consolidate
);
criterion_main!(benches);
