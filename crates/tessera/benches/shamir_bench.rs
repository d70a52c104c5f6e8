//! shamir benchmarks
//!
//! Usage:
//!   cargo bench -p tessera              # split and combine
//!   cargo bench -p tessera -- combine   # combine only

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera::{combine, split_with, SeededRandom};

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let rng = SeededRandom::seed_from_u64(1);

    for len in [32usize, 256, 4096] {
        let secret = vec![0x5au8; len];
        group.bench_function(BenchmarkId::new("3-of-5", len), |b| {
            b.iter(|| split_with(&rng, black_box(&secret), 5, 3).unwrap())
        });
    }
    group.finish();
}

fn bench_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine");
    let rng = SeededRandom::seed_from_u64(2);

    for threshold in [2usize, 3, 10] {
        let secret = vec![0xa5u8; 32];
        let shares = split_with(&rng, &secret, threshold + 2, threshold).unwrap();
        let subset = &shares[..threshold];
        group.bench_function(BenchmarkId::new("32 bytes", threshold), |b| {
            b.iter(|| combine(black_box(subset)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_split, bench_combine);
criterion_main!(benches);
