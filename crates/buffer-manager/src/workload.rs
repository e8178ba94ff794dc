// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Seeded synthetic allocate/free workloads.
//!
//! Used by the `bufmgr simulate` command, the integration tests and the
//! benches, so that a seed reproduces the same request stream everywhere.
//!
//! # Example
//! ```
//! use buffer_manager::workload::{Step, Workload};
//! use buffer_manager::BufferManager;
//!
//! let mut manager = BufferManager::new(256, 2, 16).unwrap();
//! let mut workload = Workload::new(7, 200);
//! let mut held = Vec::new();
//! for _ in 0..1_000 {
//!     match workload.next_step(held.len()) {
//!         Step::Allocate(size) => held.push(manager.allocate(size).unwrap()),
//!         Step::Free(index) => manager.free(held.swap_remove(index)),
//!     }
//! }
//! manager.check_partition(&held).unwrap();
//! ```

/// Deterministic 64-bit linear congruential generator.
#[derive(Debug, Clone)]
pub struct Lcg64 {
    state: u64,
}

impl Lcg64 {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        // Low bits of an LCG have short periods.
        self.state >> 11
    }

    /// Value in `0..upper`.
    ///
    /// # Panics
    /// Panics if `upper` is zero.
    pub fn below(&mut self, upper: usize) -> usize {
        assert!(upper > 0, "empty range 0..0");
        (self.next_u64() % upper as u64) as usize
    }
}

/// One step of the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Allocate(usize),
    /// Free the held buffer at this index.
    Free(usize),
}

/// Random allocations of `1..=max_size` bytes interleaved with frees of
/// randomly chosen held buffers, biased towards allocation.
#[derive(Debug, Clone)]
pub struct Workload {
    rng: Lcg64,
    max_size: usize,
    allocate_percent: usize,
}

impl Workload {
    /// Default percentage of steps that allocate while something is held.
    pub const DEFAULT_ALLOCATE_PERCENT: usize = 55;

    pub fn new(seed: u64, max_size: usize) -> Self {
        Self {
            rng: Lcg64::new(seed),
            max_size: max_size.max(1),
            allocate_percent: Self::DEFAULT_ALLOCATE_PERCENT,
        }
    }

    /// Sets the share of steps (0 to 100) that allocate while buffers are
    /// held. Values above 100 are clamped.
    pub fn with_allocate_percent(mut self, percent: usize) -> Self {
        self.allocate_percent = percent.min(100);
        self
    }

    /// Largest request this workload produces.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Next step given how many buffers the caller currently holds.
    pub fn next_step(&mut self, held: usize) -> Step {
        if held == 0 || self.rng.below(100) < self.allocate_percent {
            Step::Allocate(1 + self.rng.below(self.max_size))
        } else {
            Step::Free(self.rng.below(held))
        }
    }
}
