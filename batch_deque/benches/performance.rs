use std::collections::VecDeque;

use batch_deque::BatchDeque;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_push_both_ends(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_both_ends");

    for size in [100, 10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64 * 2));
        group.bench_with_input(BenchmarkId::new("batch_deque", size), size, |b, &size| {
            b.iter(|| {
                let mut dq: BatchDeque<u64> = BatchDeque::new();
                for i in 0..size as u64 {
                    dq.push_back(black_box(i));
                    dq.push_front(black_box(i));
                }
                black_box(dq.len())
            });
        });
        group.bench_with_input(BenchmarkId::new("vec_deque", size), size, |b, &size| {
            b.iter(|| {
                let mut dq: VecDeque<u64> = VecDeque::new();
                for i in 0..size as u64 {
                    dq.push_back(black_box(i));
                    dq.push_front(black_box(i));
                }
                black_box(dq.len())
            });
        });
    }
    group.finish();
}

fn bench_random_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_access");

    for size in [10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("batch_deque", size), size, |b, &size| {
            let dq: BatchDeque<u64> = (0..size as u64).collect();

            b.iter(|| {
                let mut sum = 0u64;
                for i in 0..size {
                    sum = sum.wrapping_add(dq[(i * 7919) % size]);
                }
                black_box(sum)
            });
        });
        group.bench_with_input(BenchmarkId::new("vec_deque", size), size, |b, &size| {
            let dq: VecDeque<u64> = (0..size as u64).collect();

            b.iter(|| {
                let mut sum = 0u64;
                for i in 0..size {
                    sum = sum.wrapping_add(dq[(i * 7919) % size]);
                }
                black_box(sum)
            });
        });
    }
    group.finish();
}

fn bench_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration");
    let dq: BatchDeque<u64> = (0..10_000).collect();

    group.throughput(Throughput::Elements(dq.len() as u64));
    group.bench_function("elements", |b| {
        b.iter(|| black_box(dq.iter().sum::<u64>()));
    });
    group.bench_function("segments", |b| {
        b.iter(|| black_box(dq.segments().map(|run| run.iter().sum::<u64>()).sum::<u64>()));
    });
    group.finish();
}

fn bench_stable_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("middle_batch_insert");

    for size in [10_000].iter() {
        group.throughput(Throughput::Elements(512));
        group.bench_with_input(BenchmarkId::new("stable_insert", size), size, |b, &size| {
            b.iter(|| {
                let mut dq: BatchDeque<u64> = (0..size as u64).collect();
                let at = dq.stable_insert(size / 2, 0..512);
                black_box(at)
            });
        });
        group.bench_with_input(BenchmarkId::new("insert_iter", size), size, |b, &size| {
            b.iter(|| {
                let mut dq: BatchDeque<u64> = (0..size as u64).collect();
                dq.insert_iter(size / 2, 0..512);
                black_box(dq.len())
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_push_both_ends,
    bench_random_access,
    bench_iteration,
    bench_stable_insert
);
criterion_main!(benches);
