//! Criterion benchmarks for `aif-math`.
//!
//! Focus on the kernels that run once per factor or channel in every
//! inference cycle.

use aif_math::{entropy, mat_vec, softmax};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_categorical_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("categorical");

    for n in [4usize, 5, 16] {
        let logits: Vec<f64> = (0..n).map(|i| (i as f64) * 0.37 - 1.0).collect();
        group.bench_with_input(BenchmarkId::new("softmax", n), &logits, |b, l| {
            b.iter(|| black_box(softmax(black_box(l), black_box(1.0))));
        });

        let probs = softmax(&logits, 1.0);
        group.bench_with_input(BenchmarkId::new("entropy", n), &probs, |b, p| {
            b.iter(|| black_box(entropy(black_box(p))));
        });

        let matrix: Vec<Vec<f64>> = (0..n)
            .map(|r| (0..n).map(|c| if r == c { 0.7 } else { 0.3 / (n as f64 - 1.0) }).collect())
            .collect();
        group.bench_with_input(BenchmarkId::new("mat_vec", n), &probs, |b, p| {
            b.iter(|| black_box(mat_vec(black_box(&matrix), black_box(p))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_categorical_kernels);
criterion_main!(benches);
