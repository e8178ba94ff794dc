// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `bufmgr simulate` command: drive a seeded workload and report.
//!
//! Every buffer is filled with a tag byte when allocated and checked when
//! freed, so overlapping buffers show up as corruption. After the workload
//! the partition invariant is verified against the buffers still held,
//! everything is freed and empty buckets are released with `shrink`.

use buffer_manager::workload::{Step, Workload};
use buffer_manager::{
    Buffer, BufferError, BufferManager, BufferManagerConfig, BufferManagerStats, ByteSize,
    SyncBufferManager,
};
use std::thread;
use std::time::Instant;

pub struct Options {
    pub ops: usize,
    pub max_size: Option<String>,
    pub seed: u64,
    pub threads: usize,
    pub json: bool,
}

/// What a simulation run produced.
#[derive(Debug, serde::Serialize)]
struct Report {
    bucket_size: usize,
    bucket_burst: usize,
    buffer_burst: usize,
    max_size: usize,
    seed: u64,
    threads: usize,
    ops_per_thread: usize,
    allocations: u64,
    frees: u64,
    corrupted_buffers: usize,
    partition_error: Option<String>,
    elapsed_ms: f64,
    before_release: BufferManagerStats,
    buckets_released: usize,
    after_release: BufferManagerStats,
}

/// The operations the workload needs, over either manager flavour.
trait Target {
    fn allocate(&mut self, size: usize) -> Result<Buffer, BufferError>;
    fn free(&mut self, buffer: Buffer);
    fn fill(&mut self, buffer: &mut Buffer, tag: u8);
    fn holds(&mut self, buffer: &Buffer, tag: u8) -> bool;
    fn check_partition(&self, held: &[Buffer]) -> Result<(), BufferError>;
    fn stats(&self) -> BufferManagerStats;
    fn shrink(&mut self) -> usize;
}

impl Target for BufferManager {
    fn allocate(&mut self, size: usize) -> Result<Buffer, BufferError> {
        BufferManager::allocate(self, size)
    }

    fn free(&mut self, buffer: Buffer) {
        BufferManager::free(self, buffer)
    }

    fn fill(&mut self, buffer: &mut Buffer, tag: u8) {
        self.data_mut(buffer).fill(tag);
    }

    fn holds(&mut self, buffer: &Buffer, tag: u8) -> bool {
        self.data(buffer).iter().all(|&b| b == tag)
    }

    fn check_partition(&self, held: &[Buffer]) -> Result<(), BufferError> {
        BufferManager::check_partition(self, held)
    }

    fn stats(&self) -> BufferManagerStats {
        BufferManager::stats(self)
    }

    fn shrink(&mut self) -> usize {
        BufferManager::shrink(self)
    }
}

impl Target for SyncBufferManager {
    fn allocate(&mut self, size: usize) -> Result<Buffer, BufferError> {
        SyncBufferManager::allocate(self, size)
    }

    fn free(&mut self, buffer: Buffer) {
        SyncBufferManager::free(self, buffer)
    }

    fn fill(&mut self, buffer: &mut Buffer, tag: u8) {
        self.with_data_mut(buffer, |bytes| bytes.fill(tag));
    }

    fn holds(&mut self, buffer: &Buffer, tag: u8) -> bool {
        self.with_data(buffer, |bytes| bytes.iter().all(|&b| b == tag))
    }

    fn check_partition(&self, held: &[Buffer]) -> Result<(), BufferError> {
        SyncBufferManager::check_partition(self, held)
    }

    fn stats(&self) -> BufferManagerStats {
        SyncBufferManager::stats(self)
    }

    fn shrink(&mut self) -> usize {
        SyncBufferManager::shrink(self)
    }
}

/// Per-thread result of running the workload.
#[derive(Default)]
struct Outcome {
    held: Vec<(Buffer, u8)>,
    allocations: u64,
    frees: u64,
    corrupted: usize,
}

impl Outcome {
    fn absorb(&mut self, other: Outcome) {
        self.held.extend(other.held);
        self.allocations += other.allocations;
        self.frees += other.frees;
        self.corrupted += other.corrupted;
    }
}

fn drive<T: Target>(
    target: &mut T,
    seed: u64,
    ops: usize,
    max_size: usize,
) -> Result<Outcome, BufferError> {
    let mut workload = Workload::new(seed, max_size);
    let mut out = Outcome::default();

    for _ in 0..ops {
        match workload.next_step(out.held.len()) {
            Step::Allocate(size) => {
                let mut buffer = target.allocate(size)?;
                let tag = (out.allocations % 251) as u8 + 1;
                target.fill(&mut buffer, tag);
                out.allocations += 1;
                out.held.push((buffer, tag));
            }
            Step::Free(index) => {
                let (buffer, tag) = out.held.swap_remove(index);
                if !target.holds(&buffer, tag) {
                    tracing::warn!(range = ?buffer.range(), "buffer contents overwritten");
                    out.corrupted += 1;
                }
                target.free(buffer);
                out.frees += 1;
            }
        }
    }
    Ok(out)
}

pub fn execute(config: BufferManagerConfig, options: Options) -> anyhow::Result<()> {
    let bucket_size = config.parse_bucket_size()?.as_bytes();
    let max_size = match &options.max_size {
        Some(s) => ByteSize::parse(s)?.as_bytes(),
        None => bucket_size,
    };
    if max_size > bucket_size {
        anyhow::bail!(
            "max size {} exceeds the bucket size {}",
            ByteSize::from_bytes(max_size),
            ByteSize::from_bytes(bucket_size),
        );
    }
    if options.threads == 0 {
        anyhow::bail!("at least one thread is required");
    }
    if config.bucket_burst == 0 || config.buffer_burst == 0 {
        anyhow::bail!("bucket and buffer bursts must be at least 1 to run a workload");
    }

    tracing::info!(
        bucket_size,
        max_size,
        threads = options.threads,
        ops = options.ops,
        seed = options.seed,
        "starting simulation"
    );

    let start = Instant::now();
    let report = if options.threads > 1 || config.synchronized {
        let manager = config.build_sync()?;
        let workers: Vec<_> = (0..options.threads)
            .map(|t| {
                let mut handle = manager.clone();
                let seed = options.seed.wrapping_add(t as u64);
                let ops = options.ops;
                thread::spawn(move || drive(&mut handle, seed, ops, max_size))
            })
            .collect();

        let mut outcome = Outcome::default();
        for worker in workers {
            let result = worker
                .join()
                .map_err(|_| anyhow::anyhow!("simulation thread panicked"))?;
            outcome.absorb(result?);
        }
        let elapsed = start.elapsed();
        finish(manager, outcome, elapsed.as_secs_f64(), &config, &options, max_size)?
    } else {
        let mut manager = config.build()?;
        let outcome = drive(&mut manager, options.seed, options.ops, max_size)?;
        let elapsed = start.elapsed();
        finish(manager, outcome, elapsed.as_secs_f64(), &config, &options, max_size)?
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(err) = &report.partition_error {
        anyhow::bail!("partition check failed: {err}");
    }
    if report.corrupted_buffers > 0 {
        anyhow::bail!("{} buffers were overwritten", report.corrupted_buffers);
    }
    Ok(())
}

/// Verifies, releases everything and assembles the report.
fn finish<T: Target>(
    mut target: T,
    outcome: Outcome,
    elapsed_secs: f64,
    config: &BufferManagerConfig,
    options: &Options,
    max_size: usize,
) -> anyhow::Result<Report> {
    let mut corrupted = outcome.corrupted;
    let (buffers, tags): (Vec<Buffer>, Vec<u8>) = outcome.held.into_iter().unzip();

    let partition_error = match target.check_partition(&buffers) {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(error = %e, "partition invariant violated");
            Some(e.to_string())
        }
    };
    let before_release = target.stats();

    for (buffer, tag) in buffers.into_iter().zip(tags) {
        if !target.holds(&buffer, tag) {
            corrupted += 1;
        }
        target.free(buffer);
    }
    let buckets_released = target.shrink();
    let after_release = target.stats();

    Ok(Report {
        bucket_size: config.parse_bucket_size()?.as_bytes(),
        bucket_burst: config.bucket_burst,
        buffer_burst: config.buffer_burst,
        max_size,
        seed: options.seed,
        threads: options.threads,
        ops_per_thread: options.ops,
        allocations: outcome.allocations,
        frees: outcome.frees,
        corrupted_buffers: corrupted,
        partition_error,
        elapsed_ms: elapsed_secs * 1000.0,
        before_release,
        buckets_released,
        after_release,
    })
}

fn print_report(r: &Report) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           bufmgr · Workload Simulation              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Workload ───────────────────────────────────────────────
    println!("  Workload");
    println!("   Bucket size:  {}", ByteSize::from_bytes(r.bucket_size));
    println!("   Max request:  {}", ByteSize::from_bytes(r.max_size));
    println!("   Bursts:       {} buckets / {} ranges", r.bucket_burst, r.buffer_burst);
    println!("   Threads:      {} x {} ops (seed {})", r.threads, r.ops_per_thread, r.seed);
    println!(
        "   Completed:    {} allocations, {} frees in {:.1} ms",
        r.allocations, r.frees, r.elapsed_ms,
    );
    println!();

    // ── Before Release ─────────────────────────────────────────
    let s = &r.before_release;
    println!("  Before release");
    println!(
        "   Buckets:      {} reserved, {} with free space",
        s.reserved_buckets, s.available_buckets,
    );
    println!(
        "   Live:         {} buffers, {} bytes  {}",
        s.allocated_buffers,
        s.allocated_bytes,
        usage_bar(s.utilisation()),
    );
    println!("   Peak:         {} bytes", s.peak_allocated_bytes);
    println!(
        "   Pools:        {} / {} range records, {} / {} bucket records",
        s.buffer_pool.allocated, s.buffer_pool.reserved, s.bucket_pool.allocated, s.bucket_pool.reserved,
    );
    println!();

    // ── Checks ─────────────────────────────────────────────────
    println!("  Checks");
    match &r.partition_error {
        None => println!("   Partition:    OK"),
        Some(e) => println!("   Partition:    FAILED ({e})"),
    }
    if r.corrupted_buffers == 0 {
        println!("   Contents:     OK");
    } else {
        println!("   Contents:     {} buffers overwritten", r.corrupted_buffers);
    }
    println!();

    // ── After Release ──────────────────────────────────────────
    println!("  After release");
    println!("   Shrink:       {} buckets released", r.buckets_released);
    println!();
    println!("{}", r.after_release.summary());
}

/// Creates a visual usage bar (0.0-1.0 scale).
fn usage_bar(ratio: f64) -> String {
    let filled = ((ratio * 20.0).round() as usize).min(20);
    format!("[{}{}]", "=".repeat(filled), ".".repeat(20 - filled))
}
