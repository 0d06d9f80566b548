//! Performance benchmarks for the simulation engine.
//!
//! Run with: cargo bench

use chrono::{Datelike, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use harvest::data::PriceHistory;
use harvest::engine::{Engine, SimConfig};
use harvest::ledger::Ledger;
use harvest::scenario::Scenario;
use harvest::strategy::Strategy;
use harvest::types::TaxLot;

/// Weekday-only calendar of `days` trading days.
fn trading_days(days: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(days);
    let mut date = NaiveDate::from_ymd_opt(2014, 1, 2).unwrap();
    while dates.len() < days {
        if date.weekday().number_from_monday() <= 5 {
            dates.push(date);
        }
        date += chrono::Duration::days(1);
    }
    dates
}

/// Synthetic price history with deterministic per-instrument wiggle.
fn generate_history(instruments: usize, days: usize) -> PriceHistory {
    let names: Vec<String> = (0..instruments).map(|j| format!("SYM{j:02}")).collect();
    let dates = trading_days(days);
    let rows: Vec<Vec<f64>> = (0..days)
        .map(|i| {
            (0..instruments)
                .map(|j| {
                    let wave = ((i * 13 + j * 7) as f64 * 0.37).sin() * 0.08;
                    let drift = 1.0 + i as f64 * 0.0002;
                    100.0 * drift * (1.0 + wave)
                })
                .collect()
        })
        .collect();
    PriceHistory::from_parts(names, dates, rows).unwrap()
}

fn bench_strategies(c: &mut Criterion) {
    let history = generate_history(10, 1260); // 5 trading years
    let config = SimConfig {
        show_progress: false,
        ..Default::default()
    };
    let engine = Engine::new(config, history);

    let mut group = c.benchmark_group("strategies");
    group.sample_size(10);

    for strategy in Strategy::ALL {
        group.bench_with_input(
            BenchmarkId::new("run", strategy.id()),
            &strategy,
            |b, &strategy| b.iter(|| engine.run(black_box(strategy), Scenario::IncomeWithdrawal)),
        );
    }

    group.finish();
}

fn bench_hifo_liquidation(c: &mut Criterion) {
    let day = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();

    c.bench_function("hifo_liquidate_500_lots", |b| {
        b.iter_batched(
            || {
                let mut ledger = Ledger::new(0.0, 0.20);
                for i in 0..500 {
                    ledger.add_lot(TaxLot::new(
                        "SYM",
                        day + chrono::Duration::days(i),
                        10.0,
                        50.0 + (i as f64 * 0.77).sin() * 30.0,
                    ));
                }
                ledger
            },
            |mut ledger| ledger.hifo_liquidate("SYM", black_box(2500.0), 60.0, false),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_strategies, bench_hifo_liquidation);
criterion_main!(benches);
