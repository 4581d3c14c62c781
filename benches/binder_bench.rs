//! Binder edit benchmark.
//!
//! Compares edits on an unshared binder (applied in place) against edits
//! on a binder whose block is shared with a snapshot (one copy per edit).

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use cow_binder::Binder;
use std::hint::black_box;

const SIZES: [u32; 3] = [100, 1000, 10000];

fn generate_binder(size: u32) -> Binder<u32, u32> {
    let mut binder = Binder::new();
    for key in 0..size {
        binder.insert_front(key, key).unwrap();
    }
    binder
}

fn benchmark_insert_front(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("binder_insert_front");

    for size in SIZES {
        let base = generate_binder(size);
        group.bench_with_input(BenchmarkId::new("in_place", size), &size, |bencher, &size| {
            bencher.iter_batched(
                || {
                    let mut binder = base.clone();
                    binder.read_mut(&0).unwrap();
                    binder
                },
                |mut binder| black_box(binder.insert_front(black_box(size), 0)),
                BatchSize::SmallInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("copy_on_write", size), &size, |bencher, &size| {
            bencher.iter_batched(
                || base.clone(),
                |mut binder| black_box(binder.insert_front(black_box(size), 0)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_clone(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("binder_clone");

    for size in SIZES {
        let base = generate_binder(size);
        group.bench_with_input(BenchmarkId::new("shared", size), &base, |bencher, base| {
            bencher.iter(|| black_box(base.clone()));
        });
    }

    group.finish();
}

fn benchmark_read(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("binder_read");

    for size in SIZES {
        let base = generate_binder(size);
        group.bench_with_input(BenchmarkId::new("read", size), &size, |bencher, &size| {
            bencher.iter(|| black_box(base.read(&black_box(size / 2))));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_insert_front, benchmark_clone, benchmark_read);
criterion_main!(benches);
