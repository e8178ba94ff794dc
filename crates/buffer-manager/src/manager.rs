// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The buffer manager: buckets, first-fit search and bucket lifecycle.
//!
//! The [`BufferManager`] is the allocator callers talk to. It:
//!
//! 1. Keeps a list of the buckets that still have free space and scans it
//!    in list order, asking each bucket for a first-fit range.
//! 2. Mints a new bucket from its bucket pool when no listed bucket can
//!    serve a request.
//! 3. Detaches a bucket from the list as soon as its free list empties,
//!    and reattaches it at the head when a freed buffer gives it space
//!    again.
//!
//! Bucket and range records come from two independent
//! [`ObjectPool`]s; after warm-up no heap allocation happens except for the
//! storage of newly created buckets.
//!
//! # Thread Safety
//! `BufferManager` is single-threaded. Use
//! [`SyncBufferManager`](crate::SyncBufferManager) to share one.

use crate::bucket::{Bucket, BucketId, BucketLink};
use crate::buffer::{Buffer, BufferRange};
use crate::{BufferError, BufferManagerConfig, BufferManagerStats};
use object_pool::{ObjectPool, Recyclable};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a manager instance, stamped into every buffer it hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ManagerId(u64);

impl ManagerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Variable-size buffer allocator over fixed-size buckets.
///
/// # Example
/// ```
/// use buffer_manager::BufferManager;
///
/// let mut manager = BufferManager::new(1024, 4, 64).unwrap();
///
/// let mut a = manager.allocate(100).unwrap();
/// manager.data_mut(&mut a).fill(0xAB);
/// assert_eq!(manager.data(&a)[99], 0xAB);
///
/// let b = manager.allocate(200).unwrap();
/// assert_eq!(manager.stats().allocated_bytes, 300);
/// assert_eq!(manager.stats().reserved_buckets, 1);
///
/// manager.free(a);
/// manager.free(b);
/// assert_eq!(manager.free_ranges(manager.buckets_with_space()[0]), vec![0..1024]);
///
/// // Larger than a bucket: refused, nothing changes.
/// assert!(manager.allocate(2048).is_err());
/// ```
pub struct BufferManager {
    id: ManagerId,
    bucket_size: usize,
    buckets: ObjectPool<Bucket>,
    ranges: ObjectPool<BufferRange>,
    /// Head of the list of buckets with at least one free range.
    available: Option<BucketId>,
    stats: BufferManagerStats,
}

impl BufferManager {
    /// Creates a manager carving buffers out of `bucket_size`-byte buckets.
    ///
    /// `bucket_burst` and `buffer_burst` are the burst sizes of the bucket
    /// and range record pools. Only `bucket_size` is checked here; a zero
    /// burst is accepted and panics once its pool first has to mint.
    pub fn new(
        bucket_size: usize,
        bucket_burst: usize,
        buffer_burst: usize,
    ) -> Result<Self, BufferError> {
        if bucket_size == 0 {
            return Err(BufferError::InvalidSize(
                "bucket size must be at least 1 byte".to_string(),
            ));
        }

        Ok(Self {
            id: ManagerId::next(),
            bucket_size,
            buckets: ObjectPool::with_default_items(bucket_burst),
            ranges: ObjectPool::with_default_items(buffer_burst),
            available: None,
            stats: BufferManagerStats::default(),
        })
    }

    /// Creates a manager from a parsed configuration.
    pub fn from_config(config: &BufferManagerConfig) -> Result<Self, BufferError> {
        let bucket_size = config.parse_bucket_size()?;
        Self::new(
            bucket_size.as_bytes(),
            config.bucket_burst,
            config.buffer_burst,
        )
    }

    /// Size of every bucket, and so the largest possible buffer.
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// Allocates a buffer of exactly `size` bytes.
    ///
    /// Returns `Err(Oversize)` if `size` exceeds the bucket size and
    /// `Err(ZeroSizedAllocation)` for `size == 0`. Neither touches any
    /// counter. Running out of space in existing buckets is never an error:
    /// a new bucket is created instead.
    pub fn allocate(&mut self, size: usize) -> Result<Buffer, BufferError> {
        if size == 0 {
            return Err(BufferError::ZeroSizedAllocation);
        }
        if size > self.bucket_size {
            return Err(BufferError::Oversize {
                requested: size,
                bucket_size: self.bucket_size,
            });
        }

        let (bucket, range) = self.take_range(size);
        self.stats.record_allocation(size);

        let record = self.ranges.get(range);
        debug_assert_eq!(record.size, size);
        debug_assert!(record.end() <= self.bucket_size, "buffer overrun");
        Ok(Buffer {
            owner: self.id,
            range,
            bucket,
            start: record.start,
            size,
        })
    }

    /// Returns a buffer to its bucket, coalescing it with adjacent free
    /// space.
    ///
    /// # Panics
    /// Panics if `buffer` was allocated by a different manager.
    pub fn free(&mut self, buffer: Buffer) {
        self.assert_owned(&buffer);
        let Buffer {
            range,
            bucket,
            start,
            size,
            ..
        } = buffer;
        debug_assert_eq!(
            self.ranges.get(range).as_range(),
            start..start + size,
            "in-use range record changed while checked out"
        );

        self.stats.record_free(size);

        let record = self.buckets.get_mut(bucket);
        record.release(range, &mut self.ranges);
        if record.is_detached() {
            self.attach(bucket);
        }
    }

    /// Read-only view of a buffer's bytes.
    ///
    /// # Panics
    /// Panics if `buffer` was allocated by a different manager.
    pub fn data(&self, buffer: &Buffer) -> &[u8] {
        self.assert_owned(buffer);
        self.buckets.get(buffer.bucket).bytes(buffer.range())
    }

    /// Mutable view of a buffer's bytes.
    ///
    /// # Panics
    /// Panics if `buffer` was allocated by a different manager.
    pub fn data_mut(&mut self, buffer: &mut Buffer) -> &mut [u8] {
        self.assert_owned(buffer);
        self.buckets.get_mut(buffer.bucket).bytes_mut(buffer.range())
    }

    /// Returns a snapshot of the manager and pool counters.
    pub fn stats(&self) -> BufferManagerStats {
        BufferManagerStats {
            buffer_pool: self.ranges.stats(),
            bucket_pool: self.buckets.stats(),
            ..self.stats.clone()
        }
    }

    /// Releases every bucket that is entirely free back to the bucket
    /// pool, dropping its storage. In-use buffers are never moved.
    ///
    /// Returns the number of buckets released.
    pub fn shrink(&mut self) -> usize {
        let mut released = 0;
        let mut prev: Option<BucketId> = None;
        let mut cursor = self.available;

        while let Some(id) = cursor {
            let bucket = self.buckets.get(id);
            let next = bucket.next();

            match bucket.whole_free_range(&self.ranges) {
                Some(whole) => {
                    self.unlink(prev, next);
                    self.ranges.free(whole);
                    self.buckets.get_mut(id).reset();
                    self.buckets.free(id);
                    self.stats.record_bucket_released(self.bucket_size);
                    released += 1;
                }
                None => prev = cursor,
            }
            cursor = next;
        }

        if released > 0 {
            tracing::info!(
                "shrink released {released} bucket(s), {} remain reserved",
                self.stats.reserved_buckets,
            );
        }
        released
    }

    /// Buckets that currently have free space, in list order.
    pub fn buckets_with_space(&self) -> Vec<BucketId> {
        let mut out = Vec::with_capacity(self.stats.available_buckets);
        let mut cursor = self.available;
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.buckets.get(id).next();
        }
        out
    }

    /// Free ranges of `bucket`, in free-list order.
    pub fn free_ranges(&self, bucket: BucketId) -> Vec<Range<usize>> {
        self.buckets.get(bucket).free_ranges(&self.ranges)
    }

    /// Link state of `bucket`.
    pub fn bucket_link(&self, bucket: BucketId) -> BucketLink {
        self.buckets.get(bucket).link()
    }

    /// Verifies that the free ranges of every live bucket, together with
    /// the given in-use buffers, tile each bucket exactly once.
    ///
    /// `in_use` must list every buffer currently held from this manager.
    pub fn check_partition<'a, I>(&self, in_use: I) -> Result<(), BufferError>
    where
        I: IntoIterator<Item = &'a Buffer>,
    {
        let mut coverage: HashMap<BucketId, Vec<Range<usize>>> = self
            .buckets_with_space()
            .into_iter()
            .map(|id| (id, self.free_ranges(id)))
            .collect();

        let mut held = 0;
        for buffer in in_use {
            if buffer.owner != self.id {
                return Err(BufferError::Corruption(format!(
                    "buffer at {:?} belongs to another manager",
                    buffer.range()
                )));
            }
            held += 1;
            coverage
                .entry(buffer.bucket)
                .or_insert_with(|| self.free_ranges(buffer.bucket))
                .push(buffer.range());
        }

        if held != self.stats.allocated_buffers {
            return Err(BufferError::Corruption(format!(
                "{held} buffers supplied but {} are allocated",
                self.stats.allocated_buffers
            )));
        }
        if coverage.len() != self.stats.reserved_buckets {
            return Err(BufferError::Corruption(format!(
                "{} buckets reachable but {} are reserved",
                coverage.len(),
                self.stats.reserved_buckets
            )));
        }

        for (id, mut ranges) in coverage {
            ranges.sort_by_key(|r| r.start);
            let mut expected = 0;
            for r in &ranges {
                if r.start != expected || r.end <= r.start {
                    return Err(BufferError::Corruption(format!(
                        "{id:?}: range {r:?} breaks the tiling at offset {expected}"
                    )));
                }
                expected = r.end;
            }
            if expected != self.bucket_size {
                return Err(BufferError::Corruption(format!(
                    "{id:?}: ranges cover {expected} of {} bytes",
                    self.bucket_size
                )));
            }
        }

        Ok(())
    }

    /// Finds or creates space for `size` bytes.
    fn take_range(&mut self, size: usize) -> (BucketId, object_pool::Handle<BufferRange>) {
        let mut prev: Option<BucketId> = None;
        let mut cursor = self.available;

        while let Some(id) = cursor {
            let bucket = self.buckets.get_mut(id);
            let next = bucket.next();
            if let Some(range) = bucket.allocate(size, &mut self.ranges) {
                if !bucket.has_free_space() {
                    self.unlink(prev, next);
                    self.buckets.get_mut(id).set_link(BucketLink::Detached);
                    tracing::trace!("bucket {id:?} exhausted, detached");
                }
                return (id, range);
            }
            prev = cursor;
            cursor = next;
        }

        let id = self.create_bucket();
        let range = match self.buckets.get_mut(id).allocate(size, &mut self.ranges) {
            Some(range) => range,
            None => unreachable!("a fresh {}-byte bucket cannot hold {size} bytes", self.bucket_size),
        };
        if self.buckets.get(id).has_free_space() {
            self.attach(id);
        } else {
            self.buckets.get_mut(id).set_link(BucketLink::Detached);
        }
        (id, range)
    }

    fn create_bucket(&mut self) -> BucketId {
        let id = self.buckets.allocate();
        let whole = self.ranges.allocate();
        *self.ranges.get_mut(whole) = BufferRange::whole(id, self.bucket_size);
        self.buckets
            .get_mut(id)
            .install(vec![0u8; self.bucket_size].into_boxed_slice(), whole);
        self.stats.record_bucket_created(self.bucket_size);

        tracing::debug!(
            "created bucket {id:?} of {} bytes ({} reserved)",
            self.bucket_size,
            self.stats.reserved_buckets,
        );
        id
    }

    /// Pushes `id` onto the head of the available list.
    fn attach(&mut self, id: BucketId) {
        let head = self.available;
        self.buckets.get_mut(id).set_next(head);
        self.available = Some(id);
        self.stats.available_buckets += 1;
        tracing::trace!("bucket {id:?} attached");
    }

    /// Removes the entry after `prev` (or the head) from the available
    /// list, splicing in `next`.
    fn unlink(&mut self, prev: Option<BucketId>, next: Option<BucketId>) {
        match prev {
            Some(p) => self.buckets.get_mut(p).set_next(next),
            None => self.available = next,
        }
        self.stats.available_buckets -= 1;
    }

    fn assert_owned(&self, buffer: &Buffer) {
        assert!(
            buffer.owner == self.id,
            "buffer at {:?} was not allocated by this manager",
            buffer.range()
        );
    }
}

impl fmt::Debug for BufferManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferManager")
            .field("bucket_size", &self.bucket_size)
            .field("reserved_buckets", &self.stats.reserved_buckets)
            .field("available_buckets", &self.stats.available_buckets)
            .field("allocated_bytes", &self.stats.allocated_bytes)
            .finish()
    }
}
