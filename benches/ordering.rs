use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use rust_collection_processing::execution::{ExecutionEngine, ExecutionOptions};
use rust_collection_processing::inspect::Callback;
use rust_collection_processing::processing::{order_by, SortOptions};
use rust_collection_processing::types::DataType;
use rust_collection_processing::value::Value;

fn random_ints(n: usize, seed: u64) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    Value::from((0..n).map(|_| rng.random_range(0..1_000_000i64)).collect::<Vec<_>>())
}

fn identity() -> Callback<'static> {
    Callback::transform(DataType::Int64, DataType::Int64, |v| v.clone())
}

fn bench_order_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_by");
    let engine = ExecutionEngine::new(ExecutionOptions::default()).expect("thread pool");

    for size in [1_000usize, 10_000, 100_000] {
        let data = random_ints(size, 42);

        group.bench_with_input(BenchmarkId::new("sequential", size), &data, |b, data| {
            b.iter(|| order_by(black_box(data), &mut identity(), SortOptions::default()))
        });
        group.bench_with_input(BenchmarkId::new("concurrent", size), &data, |b, data| {
            let options = SortOptions {
                ascending: true,
                concurrent: true,
            };
            b.iter(|| order_by(black_box(data), &mut identity(), options))
        });
        group.bench_with_input(BenchmarkId::new("engine", size), &data, |b, data| {
            b.iter(|| engine.order_by(black_box(data), &mut identity(), true))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_order_by);
criterion_main!(benches);
