//! # Pair Lock Benchmark
//!
//! Measures the uncontended cost of the entity discipline:
//! 1. Single-entity accessor (guard + payload cell)
//! 2. Ordered pair acquisition, guarded and unguarded
//! 3. Self-pair acquisition
//! 4. N-way acquisition

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use palisade_core::{lock_many, lock_pair, update_pair, EntityError, Guardable, Lockable};

fn entity(value: u64, guarded: bool) -> Lockable<u64> {
    let mut entity = Lockable::named("Bench");
    let _ = entity.initialize_with(value);
    if guarded {
        let _ = entity.enable_thread_safety();
    }
    entity
}

fn bench_accessor(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_accessor");

    for guarded in [false, true] {
        let target = entity(1, guarded);
        group.bench_with_input(BenchmarkId::new("read", guarded), &guarded, |b, _| {
            b.iter(|| black_box(target.read("get_value", |v| *v)));
        });
    }

    group.finish();
}

fn bench_lock_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock_pair");

    for guarded in [false, true] {
        let a = entity(1, guarded);
        let b = entity(2, guarded);
        group.bench_with_input(BenchmarkId::new("distinct", guarded), &guarded, |bench, _| {
            bench.iter(|| black_box(lock_pair(&a, &b).map(|pair| pair.attempts())));
        });
        group.bench_with_input(BenchmarkId::new("self_pair", guarded), &guarded, |bench, _| {
            bench.iter(|| black_box(lock_pair(&a, &a).map(|pair| pair.attempts())));
        });
        group.bench_with_input(BenchmarkId::new("update_pair", guarded), &guarded, |bench, _| {
            bench.iter(|| {
                black_box(update_pair(&a, &b, "swap", |x, y| {
                    std::mem::swap(x, y);
                    Ok::<(), EntityError>(())
                }))
            });
        });
    }

    group.finish();
}

fn bench_lock_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock_many");

    for count in [2usize, 4, 16] {
        let entities: Vec<_> = (0..count).map(|i| entity(i as u64, true)).collect();
        let participants: Vec<&dyn Guardable> = entities.iter().rev().map(|e| e as &dyn Guardable).collect();
        group.bench_with_input(BenchmarkId::new("guarded", count), &count, |b, _| {
            b.iter(|| black_box(lock_many(&participants).map(|many| many.len())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_accessor, bench_lock_pair, bench_lock_many);
criterion_main!(benches);
