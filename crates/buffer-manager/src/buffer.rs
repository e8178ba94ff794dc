// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Buffers: contiguous sub-ranges of a bucket's storage.
//!
//! Two types describe a buffer:
//!
//! - [`BufferRange`] is the pooled record. It lives in the manager's range
//!   pool and is linked into a bucket's free list while the range is free.
//! - [`Buffer`] is what callers hold while the range is in use. It is
//!   move-only and must be handed back to the manager that produced it.
//!
//! Byte access always goes through the owning manager, which slices the
//! bucket storage by `start..end`. The view therefore cannot drift from the
//! range it describes.

use crate::bucket::BucketId;
use crate::manager::ManagerId;
use object_pool::{Handle, ObjectPool, Recyclable};
use std::ops::Range;

/// Pool record for one range of a bucket.
///
/// Invariant: `start + size <= capacity` of the owning bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BufferRange {
    pub(crate) bucket: Option<BucketId>,
    pub(crate) start: usize,
    pub(crate) size: usize,
    pub(crate) next: Option<Handle<BufferRange>>,
}

impl BufferRange {
    /// A range spanning the whole of `bucket`.
    pub(crate) fn whole(bucket: BucketId, capacity: usize) -> Self {
        Self {
            bucket: Some(bucket),
            start: 0,
            size: capacity,
            next: None,
        }
    }

    /// One past the last byte of this range.
    pub(crate) fn end(&self) -> usize {
        self.start + self.size
    }

    pub(crate) fn as_range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// True iff the two ranges are byte-adjacent, in either order.
    pub(crate) fn mergeable_with(&self, other: &BufferRange) -> bool {
        self.start == other.end() || self.end() == other.start
    }

    /// Grows this range to cover `other` as well.
    pub(crate) fn merge(&mut self, other: &BufferRange, capacity: usize) {
        debug_assert!(
            self.mergeable_with(other),
            "merging non-adjacent ranges {:?} and {:?}",
            self.as_range(),
            other.as_range()
        );
        self.start = self.start.min(other.start);
        self.size += other.size;
        debug_assert!(self.end() <= capacity, "range overrun after merge");
    }

    /// Carves the front `size` bytes off the free range `from` into a newly
    /// minted record, shrinking `from` in place to the remaining tail.
    ///
    /// `from` keeps its position in whatever list it is on.
    pub(crate) fn cut(
        ranges: &mut ObjectPool<BufferRange>,
        from: Handle<BufferRange>,
        size: usize,
        capacity: usize,
    ) -> Handle<BufferRange> {
        let source = *ranges.get(from);
        debug_assert!(size < source.size, "cut must leave a non-empty tail");

        let front = ranges.allocate();
        *ranges.get_mut(front) = BufferRange {
            bucket: source.bucket,
            start: source.start,
            size,
            next: None,
        };
        debug_assert!(ranges.get(front).end() <= capacity, "range overrun after cut");

        let tail = ranges.get_mut(from);
        tail.start += size;
        tail.size -= size;
        debug_assert!(tail.end() <= capacity, "tail overrun after cut");

        front
    }
}

impl Recyclable for BufferRange {
    fn next(&self) -> Option<Handle<Self>> {
        self.next
    }

    fn set_next(&mut self, next: Option<Handle<Self>>) {
        self.next = next;
    }

    fn reset(&mut self) {
        *self = BufferRange::default();
    }
}

/// An in-use range of a bucket, exclusively held by the caller.
///
/// A `Buffer` is produced by [`BufferManager::allocate`](crate::BufferManager::allocate)
/// and must be passed back to [`BufferManager::free`](crate::BufferManager::free)
/// on the same manager. Dropping it without freeing leaves its range
/// permanently in use; use a [`BufferGuard`](crate::BufferGuard) when
/// release-on-drop is wanted.
#[derive(Debug)]
#[must_use = "a buffer that is never freed keeps its range in use"]
pub struct Buffer {
    pub(crate) owner: ManagerId,
    pub(crate) range: Handle<BufferRange>,
    pub(crate) bucket: BucketId,
    pub(crate) start: usize,
    pub(crate) size: usize,
}

impl Buffer {
    /// Size of the buffer in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset of the first byte within the bucket storage.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset one past the last byte within the bucket storage.
    pub fn end(&self) -> usize {
        self.start + self.size
    }

    /// The byte range this buffer covers within its bucket.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// The bucket this buffer was carved from.
    pub fn bucket(&self) -> BucketId {
        self.bucket
    }
}
