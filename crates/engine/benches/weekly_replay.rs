use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use mailstock_core::{Category, WeekId};
use mailstock_engine::{Engine, EngineConfig, ManualClock, MemoryStore};
use mailstock_ledger::{EventEnvelope, ItemEvent, ItemId};
use mailstock_reporting::{WeeklyAggregate, stock_before};

/// Synthetic history: one row per week per category, mild backlog churn.
fn history(weeks: u32) -> Vec<WeeklyAggregate> {
    let updated = Utc.with_ymd_and_hms(2020, 1, 6, 0, 0, 0).unwrap();
    let mut rows = Vec::new();
    for year in 2020.. {
        for week in 1..=52u32 {
            let index = rows.len() as u32 / Category::ALL.len() as u32;
            if index >= weeks {
                return rows;
            }
            let Ok(id) = WeekId::new(year, week) else {
                continue;
            };
            for (slot, category) in Category::ALL.into_iter().enumerate() {
                let mut row = WeeklyAggregate::empty(id, category, updated);
                row.received = ((index * 7 + slot as u32) % 23) as i64;
                row.treated = ((index * 5 + slot as u32) % 19) as i64;
                row.manual_adjustment = (index as i64 % 5) - 2;
                rows.push(row);
            }
        }
    }
    rows
}

fn bench_carryover_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("carryover_replay");
    for weeks in [52u32, 260, 520] {
        let rows = history(weeks);
        let target = rows.last().map(|r| r.week).unwrap_or_else(|| {
            WeekId::new(2021, 1).expect("valid week")
        });
        group.throughput(Throughput::Elements(rows.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(weeks), &rows, |b, rows| {
            b.iter(|| black_box(stock_before(rows.iter(), target)));
        });
    }
    group.finish();
}

fn bench_ingest_with_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest_recompute");
    for items in [100u32, 1_000] {
        group.throughput(Throughput::Elements(items as u64));
        group.bench_with_input(BenchmarkId::from_parameter(items), &items, |b, &items| {
            b.iter(|| {
                let now = Utc.with_ymd_and_hms(2024, 7, 31, 10, 0, 0).unwrap();
                let clock = Arc::new(ManualClock::new(now));
                let engine = Engine::new(
                    EngineConfig::default(),
                    Arc::new(MemoryStore::new()),
                    clock,
                );
                for i in 0..items {
                    let at = now + Duration::seconds(i as i64);
                    engine.ingest(&EventEnvelope::new(
                        ItemEvent::ItemArrived {
                            identity: ItemId::new(format!("msg-{i}")),
                            location: "Inbox/Déclarations".to_string(),
                            timestamp: at,
                            read: false,
                        },
                        at,
                    ));
                }
                black_box(engine.get_current_week_snapshot())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_carryover_replay, bench_ingest_with_recompute);
criterion_main!(benches);
