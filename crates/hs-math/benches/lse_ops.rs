//! Criterion benchmarks for `hs-math`.
//!
//! Focus on the reductions that run once per state per observation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hs_math::{log_sum_exp, LogSumExp};

fn bench_lse_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_sum_exp");

    for states in [4usize, 16, 64, 256] {
        let values: Vec<f64> = (0..states).map(|i| -(i as f64) * 0.37 - 120.0).collect();

        group.bench_with_input(BenchmarkId::new("slice", states), &values, |b, v| {
            b.iter(|| black_box(log_sum_exp(black_box(v))));
        });

        group.bench_with_input(BenchmarkId::new("streaming", states), &values, |b, v| {
            b.iter(|| {
                let acc: LogSumExp = black_box(v).iter().copied().collect();
                black_box(acc.value())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lse_kernels);
criterion_main!(benches);
