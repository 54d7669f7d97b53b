//! Criterion micro-benchmarks for the shifting operations: insert and remove.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use yar_bench::{sequential, strided_indices};

fn bench_insert_front(c: &mut Criterion) {
    c.bench_function("insert_front_10k_into_10k", |b| {
        b.iter(|| {
            let mut yar = sequential(10_000).unwrap();
            for i in 0..10_000 {
                yar.insert(0, 1).unwrap()[0] = i;
            }
            black_box(yar.len());
        });
    });
}

fn bench_insert_strided(c: &mut Criterion) {
    let indices = strided_indices(10_000, 10_000);
    c.bench_function("insert_strided_10k_into_10k", |b| {
        b.iter(|| {
            let mut yar = sequential(10_000).unwrap();
            for &index in &indices {
                yar.insert(index, 1).unwrap();
            }
            black_box(yar.len());
        });
    });
}

fn bench_remove_middle(c: &mut Criterion) {
    c.bench_function("remove_middle_until_empty_10k", |b| {
        b.iter(|| {
            let mut yar = sequential(10_000).unwrap();
            while !yar.is_empty() {
                let mid = yar.len() / 2;
                yar.remove(mid, 8);
            }
            black_box(yar.capacity());
        });
    });
}

criterion_group!(
    benches,
    bench_insert_front,
    bench_insert_strided,
    bench_remove_middle
);
criterion_main!(benches);
