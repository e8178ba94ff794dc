// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for buffer allocation and release.

use buffer_manager::workload::{Step, Workload};
use buffer_manager::{BufferManager, SyncBufferManager};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Steady-state churn: one buffer allocated and freed per iteration, so the
/// bucket and range pools are warm after the first round.
fn bench_allocate_free(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_free");
    for size in [16usize, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut m = BufferManager::new(64 * 1024, 4, 64).unwrap();
            b.iter(|| {
                let buffer = m.allocate(black_box(size)).unwrap();
                m.free(buffer);
            });
        });
    }
    group.finish();
}

/// Fills whole buckets and frees them in reverse, forcing a coalescing
/// merge on every release.
fn bench_fill_and_coalesce(c: &mut Criterion) {
    c.bench_function("fill_and_coalesce_64x1k", |b| {
        let mut m = BufferManager::new(64 * 1024, 4, 128).unwrap();
        let mut held = Vec::with_capacity(64);
        b.iter(|| {
            for _ in 0..64 {
                held.push(m.allocate(1024).unwrap());
            }
            while let Some(buffer) = held.pop() {
                m.free(buffer);
            }
        });
    });
}

/// Buckets created from cold on every iteration.
fn bench_bucket_growth(c: &mut Criterion) {
    c.bench_function("bucket_growth_16x", |b| {
        b.iter(|| {
            let mut m = BufferManager::new(16 * 1024, 4, 16).unwrap();
            let held: Vec<_> = (0..16).map(|_| m.allocate(16 * 1024).unwrap()).collect();
            black_box(m.stats().reserved_buckets);
            drop(held);
        });
    });
}

/// The seeded mixed workload `bufmgr simulate` runs.
fn bench_mixed_workload(c: &mut Criterion) {
    c.bench_function("mixed_workload_10k_ops", |b| {
        b.iter(|| {
            let mut m = BufferManager::new(64 * 1024, 4, 64).unwrap();
            let mut workload = Workload::new(42, 4096);
            let mut held = Vec::new();
            for _ in 0..10_000 {
                match workload.next_step(held.len()) {
                    Step::Allocate(size) => held.push(m.allocate(size).unwrap()),
                    Step::Free(index) => m.free(held.swap_remove(index)),
                }
            }
            black_box(m.stats().peak_allocated_bytes);
        });
    });
}

fn bench_synchronized(c: &mut Criterion) {
    c.bench_function("sync_allocate_free_256", |b| {
        let m = SyncBufferManager::new(64 * 1024, 4, 64).unwrap();
        b.iter(|| {
            let buffer = m.allocate(black_box(256)).unwrap();
            m.free(buffer);
        });
    });
}

criterion_group!(
    benches,
    bench_allocate_free,
    bench_fill_and_coalesce,
    bench_bucket_growth,
    bench_mixed_workload,
    bench_synchronized
);
criterion_main!(benches);
