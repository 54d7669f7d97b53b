//! Criterion micro-benchmarks for append, bulk append and reserve/commit.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use yar_buffer::Yar;
use yar_test_utils::LargeStruct;

const N: u32 = 100_000;

fn bench_append_100k(c: &mut Criterion) {
    c.bench_function("append_100k_u32", |b| {
        b.iter(|| {
            let mut yar: Yar<u32> = Yar::new();
            for i in 0..N {
                *yar.append().unwrap() = i;
            }
            black_box(yar.len());
        });
    });

    c.bench_function("vec_push_100k_u32", |b| {
        b.iter(|| {
            let mut v: Vec<u32> = Vec::new();
            for i in 0..N {
                v.push(i);
            }
            black_box(v.len());
        });
    });
}

fn bench_append_many(c: &mut Criterion) {
    let chunk: Vec<u8> = (0..=255).collect();
    c.bench_function("append_many_1k_chunks", |b| {
        b.iter(|| {
            let mut yar: Yar<u8> = Yar::new();
            for _ in 0..1000 {
                yar.append_many(black_box(&chunk)).unwrap();
            }
            black_box(yar.len());
        });
    });
}

fn bench_reserve_commit(c: &mut Criterion) {
    c.bench_function("reserve_4k_commit_1k", |b| {
        b.iter(|| {
            let mut yar: Yar<u8> = Yar::new();
            for _ in 0..256 {
                let buf = yar.reserve(4096).unwrap();
                buf[..1000].fill(0xAA);
                yar.commit(1000).unwrap();
            }
            black_box(yar.len());
        });
    });
}

fn bench_large_struct_append(c: &mut Criterion) {
    c.bench_function("append_64_large_structs", |b| {
        b.iter(|| {
            let mut meshes: Yar<LargeStruct> = Yar::new();
            for i in 0..64 {
                meshes.append().unwrap().count = i;
            }
            black_box(meshes.len());
        });
    });
}

criterion_group!(
    benches,
    bench_append_100k,
    bench_append_many,
    bench_reserve_commit,
    bench_large_struct_append
);
criterion_main!(benches);
