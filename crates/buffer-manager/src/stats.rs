// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Buffer manager statistics for diagnostics and tuning.
//!
//! [`BufferManagerStats`] combines the manager's own bucket and byte
//! counters with snapshots of its two record pools. These are what you
//! look at when choosing a bucket size and burst sizes.

use object_pool::PoolStats;

/// Aggregate counters of a [`BufferManager`](crate::BufferManager).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BufferManagerStats {
    /// Buckets currently backed by storage.
    pub reserved_buckets: usize,
    /// Bytes of storage held by reserved buckets.
    pub reserved_bytes: usize,
    /// Buckets on the list of buckets with free space.
    pub available_buckets: usize,
    /// Buffers currently held by callers.
    pub allocated_buffers: usize,
    /// Bytes currently held by callers.
    pub allocated_bytes: usize,
    /// Buffers ever handed out.
    pub total_allocated_buffers: u64,
    /// Bytes ever handed out.
    pub total_allocated_bytes: u64,
    /// High-water mark of `allocated_bytes`.
    pub peak_allocated_bytes: usize,
    /// Buckets returned to the bucket pool by `shrink`.
    pub released_buckets: u64,
    /// Snapshot of the range-record pool.
    pub buffer_pool: PoolStats,
    /// Snapshot of the bucket-record pool.
    pub bucket_pool: PoolStats,
}

impl BufferManagerStats {
    /// Reserved bytes not currently held by callers.
    pub fn free_bytes(&self) -> usize {
        self.reserved_bytes - self.allocated_bytes
    }

    /// Fraction of reserved bytes held by callers, in `[0.0, 1.0]`.
    ///
    /// Returns `0.0` when nothing is reserved.
    pub fn utilisation(&self) -> f64 {
        if self.reserved_bytes == 0 {
            return 0.0;
        }
        self.allocated_bytes as f64 / self.reserved_bytes as f64
    }

    pub(crate) fn record_allocation(&mut self, size: usize) {
        self.allocated_buffers += 1;
        self.allocated_bytes += size;
        self.total_allocated_buffers += 1;
        self.total_allocated_bytes += size as u64;
        if self.allocated_bytes > self.peak_allocated_bytes {
            self.peak_allocated_bytes = self.allocated_bytes;
        }
    }

    pub(crate) fn record_free(&mut self, size: usize) {
        self.allocated_buffers -= 1;
        self.allocated_bytes -= size;
    }

    pub(crate) fn record_bucket_created(&mut self, bucket_size: usize) {
        self.reserved_buckets += 1;
        self.reserved_bytes += bucket_size;
    }

    pub(crate) fn record_bucket_released(&mut self, bucket_size: usize) {
        self.reserved_buckets -= 1;
        self.reserved_bytes -= bucket_size;
        self.released_buckets += 1;
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Buckets: {} reserved ({} with free space), {} bytes; \
             Buffers: {} live ({} bytes, {:.0}% utilised), peak {} bytes, \
             {} lifetime ({} bytes); pools: {}/{} ranges, {}/{} buckets",
            self.reserved_buckets,
            self.available_buckets,
            self.reserved_bytes,
            self.allocated_buffers,
            self.allocated_bytes,
            self.utilisation() * 100.0,
            self.peak_allocated_bytes,
            self.total_allocated_buffers,
            self.total_allocated_bytes,
            self.buffer_pool.allocated,
            self.buffer_pool.reserved,
            self.bucket_pool.allocated,
            self.bucket_pool.reserved,
        )
    }
}
