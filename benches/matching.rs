//! Benchmarks for the matching hot path.
//!
//! Order flow is generated deterministically so runs are comparable.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use clobvm::{Matcher, Order, OrderSide};

/// A book with `levels` price levels per side around a 10_000-tick mid.
fn seeded_matcher(levels: u64, orders_per_level: u64) -> Matcher {
    let mut matcher = Matcher::new();
    for level in 0..levels {
        for slot in 0..orders_per_level {
            let bid = Order::limit(
                format!("b-{}-{}", level, slot),
                "",
                OrderSide::Buy,
                9_999 - level,
                10,
            );
            let ask = Order::limit(
                format!("s-{}-{}", level, slot),
                "",
                OrderSide::Sell,
                10_001 + level,
                10,
            );
            matcher.place_order(bid).unwrap();
            matcher.place_order(ask).unwrap();
        }
    }
    matcher
}

fn bench_rest_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("rest_order");
    group.throughput(Throughput::Elements(1));
    group.bench_function("non_crossing_limit", |b| {
        b.iter_batched(
            || seeded_matcher(32, 4),
            |mut matcher| {
                matcher
                    .place_order(Order::limit("fresh", "", OrderSide::Buy, 9_000, 10))
                    .unwrap()
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_match_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_order");
    group.throughput(Throughput::Elements(1));
    group.bench_function("single_level_fill", |b| {
        b.iter_batched(
            || seeded_matcher(32, 4),
            |mut matcher| {
                matcher
                    .place_order(Order::limit("taker", "", OrderSide::Buy, 10_001, 10))
                    .unwrap()
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("sweep_four_levels", |b| {
        b.iter_batched(
            || seeded_matcher(32, 4),
            |mut matcher| {
                matcher
                    .place_order(Order::market("taker", "", OrderSide::Buy, 160))
                    .unwrap()
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_cancel_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel_order");
    group.throughput(Throughput::Elements(1));
    group.bench_function("mid_queue_cancel", |b| {
        b.iter_batched(
            || seeded_matcher(32, 4),
            |mut matcher| matcher.cancel_order("b-0-2").unwrap(),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_rest_order,
    bench_match_order,
    bench_cancel_order
);
criterion_main!(benches);
