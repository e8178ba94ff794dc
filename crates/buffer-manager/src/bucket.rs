// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Buckets: fixed-size storage blocks partitioned into buffers.
//!
//! Each [`Bucket`] owns its storage plus an unordered free list of
//! non-overlapping [`BufferRange`]s covering the bytes nobody holds.
//!
//! # Allocation: first fit
//! The free list is scanned in list order. An exact-size range is unlinked
//! and handed out whole; the first larger range has its front carved off
//! and stays where it is in the list with the remaining tail. Smaller
//! ranges are skipped. There is no best-fit search and no address ordering,
//! so fragmentation depends on the order of frees.
//!
//! # Release: coalescing
//! A released range absorbs every byte-adjacent free range. Because the
//! list is unordered, the scan restarts from the head after each merge so
//! that a left and a right neighbour are both found wherever they sit. The
//! grown range is then pushed onto the head of the list.

use crate::buffer::BufferRange;
use object_pool::{Handle, ObjectPool, Recyclable};
use std::fmt;
use std::ops::Range;

/// Handle naming a bucket inside its manager.
pub type BucketId = Handle<Bucket>;

/// Where a bucket's link currently points.
///
/// The same link serves the bucket pool's free list and the manager's list
/// of buckets with free space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BucketLink {
    /// Not followed by anything: the tail of a list, or a blank record.
    #[default]
    None,
    /// Followed by another bucket in the same list.
    Next(BucketId),
    /// Fully used and out of every list; only in-use buffers reach it.
    Detached,
}

/// A fixed-capacity block of bytes and the free list describing its
/// unused part.
#[derive(Default)]
pub struct Bucket {
    storage: Box<[u8]>,
    free_buffers: Option<Handle<BufferRange>>,
    link: BucketLink,
}

impl Bucket {
    /// Installs fresh storage and its single covering free range.
    pub(crate) fn install(&mut self, storage: Box<[u8]>, whole: Handle<BufferRange>) {
        self.storage = storage;
        self.free_buffers = Some(whole);
    }

    /// Size of the storage block in bytes.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the current link state.
    pub fn link(&self) -> BucketLink {
        self.link
    }

    pub(crate) fn set_link(&mut self, link: BucketLink) {
        self.link = link;
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.link == BucketLink::Detached
    }

    /// True if at least one free range remains.
    pub fn has_free_space(&self) -> bool {
        self.free_buffers.is_some()
    }

    pub(crate) fn bytes(&self, range: Range<usize>) -> &[u8] {
        &self.storage[range]
    }

    pub(crate) fn bytes_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.storage[range]
    }

    /// First-fit allocation of `size` bytes from the free list.
    ///
    /// Returns `None` when no single free range is large enough.
    pub(crate) fn allocate(
        &mut self,
        size: usize,
        ranges: &mut ObjectPool<BufferRange>,
    ) -> Option<Handle<BufferRange>> {
        let capacity = self.capacity();
        let mut prev = None;
        let mut cursor = self.free_buffers;

        while let Some(candidate) = cursor {
            let free = *ranges.get(candidate);

            if free.size == size {
                self.unlink(prev, free.next, ranges);
                ranges.get_mut(candidate).set_next(None);
                return Some(candidate);
            }
            if free.size > size {
                return Some(BufferRange::cut(ranges, candidate, size, capacity));
            }

            prev = cursor;
            cursor = free.next;
        }

        None
    }

    /// Returns `released` to the free list, coalescing it with every
    /// adjacent free range.
    pub(crate) fn release(
        &mut self,
        released: Handle<BufferRange>,
        ranges: &mut ObjectPool<BufferRange>,
    ) {
        let capacity = self.capacity();
        let mut prev = None;
        let mut cursor = self.free_buffers;

        while let Some(current) = cursor {
            let free = *ranges.get(current);

            if ranges.get(released).mergeable_with(&free) {
                ranges.get_mut(released).merge(&free, capacity);
                self.unlink(prev, free.next, ranges);
                ranges.free(current);

                // Restart: the other neighbour may sit anywhere in the list.
                prev = None;
                cursor = self.free_buffers;
            } else {
                prev = cursor;
                cursor = free.next;
            }
        }

        ranges.get_mut(released).set_next(self.free_buffers);
        self.free_buffers = Some(released);
    }

    /// If the bucket is entirely free, returns the single range covering
    /// it.
    pub(crate) fn whole_free_range(
        &self,
        ranges: &ObjectPool<BufferRange>,
    ) -> Option<Handle<BufferRange>> {
        let head = self.free_buffers?;
        let range = ranges.get(head);
        (range.next.is_none() && range.start == 0 && range.size == self.capacity()).then_some(head)
    }

    /// Free ranges in free-list order.
    pub(crate) fn free_ranges(&self, ranges: &ObjectPool<BufferRange>) -> Vec<Range<usize>> {
        let mut out = Vec::new();
        let mut cursor = self.free_buffers;
        while let Some(h) = cursor {
            let range = ranges.get(h);
            out.push(range.as_range());
            cursor = range.next;
        }
        out
    }

    fn unlink(
        &mut self,
        prev: Option<Handle<BufferRange>>,
        next: Option<Handle<BufferRange>>,
        ranges: &mut ObjectPool<BufferRange>,
    ) {
        match prev {
            Some(p) => ranges.get_mut(p).set_next(next),
            None => self.free_buffers = next,
        }
    }
}

impl Recyclable for Bucket {
    fn next(&self) -> Option<Handle<Self>> {
        match self.link {
            BucketLink::Next(next) => Some(next),
            BucketLink::None | BucketLink::Detached => None,
        }
    }

    fn set_next(&mut self, next: Option<Handle<Self>>) {
        self.link = match next {
            Some(next) => BucketLink::Next(next),
            None => BucketLink::None,
        };
    }

    fn reset(&mut self) {
        self.storage = Box::default();
        self.free_buffers = None;
        self.link = BucketLink::None;
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("capacity", &self.capacity())
            .field("has_free_space", &self.has_free_space())
            .field("link", &self.link)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A single 30-byte bucket with its pools, mirroring what the manager
    /// sets up for a fresh bucket.
    struct Fixture {
        buckets: ObjectPool<Bucket>,
        ranges: ObjectPool<BufferRange>,
        id: BucketId,
    }

    impl Fixture {
        fn new(capacity: usize) -> Self {
            let mut buckets = ObjectPool::<Bucket>::with_default_items(1);
            let mut ranges = ObjectPool::<BufferRange>::with_default_items(8);
            let id = buckets.allocate();
            let whole = ranges.allocate();
            *ranges.get_mut(whole) = BufferRange::whole(id, capacity);
            buckets
                .get_mut(id)
                .install(vec![0u8; capacity].into_boxed_slice(), whole);
            Self { buckets, ranges, id }
        }

        fn allocate(&mut self, size: usize) -> Option<Handle<BufferRange>> {
            self.buckets.get_mut(self.id).allocate(size, &mut self.ranges)
        }

        fn release(&mut self, h: Handle<BufferRange>) {
            self.buckets.get_mut(self.id).release(h, &mut self.ranges);
        }

        fn free_ranges(&self) -> Vec<Range<usize>> {
            self.buckets.get(self.id).free_ranges(&self.ranges)
        }

        fn range(&self, h: Handle<BufferRange>) -> Range<usize> {
            self.ranges.get(h).as_range()
        }
    }

    #[test]
    fn test_fresh_bucket_has_one_free_range() {
        let f = Fixture::new(30);
        assert_eq!(f.free_ranges(), vec![0..30]);
        assert_eq!(f.buckets.get(f.id).capacity(), 30);
    }

    #[test]
    fn test_exact_fit_unlinks_without_cut() {
        let mut f = Fixture::new(30);
        let h = f.allocate(30).unwrap();
        assert_eq!(f.range(h), 0..30);
        assert!(!f.buckets.get(f.id).has_free_space());
        assert_eq!(f.ranges.stats().allocated, 1);
    }

    #[test]
    fn test_cut_carves_front() {
        let mut f = Fixture::new(30);
        let a = f.allocate(10).unwrap();
        let b = f.allocate(10).unwrap();
        assert_eq!(f.range(a), 0..10);
        assert_eq!(f.range(b), 10..20);
        assert_eq!(f.free_ranges(), vec![20..30]);
    }

    #[test]
    fn test_too_large_returns_none() {
        let mut f = Fixture::new(30);
        let _a = f.allocate(25).unwrap();
        assert!(f.allocate(6).is_none());
        assert_eq!(f.free_ranges(), vec![25..30]);
    }

    #[test]
    fn test_first_fit_not_best_fit() {
        let mut f = Fixture::new(30);
        let a = f.allocate(10).unwrap(); // 0..10
        let _b = f.allocate(5).unwrap(); // 10..15
        let c = f.allocate(4).unwrap(); // 15..19
        let _d = f.allocate(11).unwrap(); // 19..30

        f.release(c); // free: [15..19]
        f.release(a); // free: [0..10, 15..19]
        assert_eq!(f.free_ranges(), vec![0..10, 15..19]);

        // 15..19 would be the best fit, but 0..10 is first in the list.
        let e = f.allocate(4).unwrap();
        assert_eq!(f.range(e), 0..4);
        assert_eq!(f.free_ranges(), vec![4..10, 15..19]);
    }

    #[test]
    fn test_release_into_empty_list() {
        let mut f = Fixture::new(30);
        let a = f.allocate(30).unwrap();
        f.release(a);
        assert_eq!(f.free_ranges(), vec![0..30]);
    }

    #[test]
    fn test_release_without_neighbours_pushes_head() {
        let mut f = Fixture::new(30);
        let a = f.allocate(10).unwrap();
        let _b = f.allocate(10).unwrap();
        f.release(a);
        assert_eq!(f.free_ranges(), vec![0..10, 20..30]);
    }

    #[test]
    fn test_scrambled_frees_coalesce_completely() {
        let mut f = Fixture::new(30);
        let a = f.allocate(10).unwrap();
        let b = f.allocate(10).unwrap();
        let c = f.allocate(10).unwrap();
        assert_eq!((f.range(a), f.range(b), f.range(c)), (0..10, 10..20, 20..30));

        f.release(b);
        f.release(a);
        f.release(c);

        assert_eq!(f.free_ranges(), vec![0..30]);
        // Only the surviving covering range is still checked out.
        assert_eq!(f.ranges.stats().allocated, 1);
    }

    #[test]
    fn test_release_merges_both_neighbours() {
        let mut f = Fixture::new(40);
        let a = f.allocate(10).unwrap();
        let b = f.allocate(10).unwrap();
        let c = f.allocate(10).unwrap();
        let _d = f.allocate(10).unwrap();

        f.release(c); // [20..30]
        f.release(a); // [0..10, 20..30]
        f.release(b); // bridges both

        assert_eq!(f.free_ranges(), vec![0..30]);
    }

    #[test]
    fn test_whole_free_range() {
        let mut f = Fixture::new(30);
        assert!(f.buckets.get(f.id).whole_free_range(&f.ranges).is_some());
        let a = f.allocate(1).unwrap();
        assert!(f.buckets.get(f.id).whole_free_range(&f.ranges).is_none());
        f.release(a);
        assert!(f.buckets.get(f.id).whole_free_range(&f.ranges).is_some());
    }

    #[test]
    fn test_link_states() {
        let mut f = Fixture::new(8);
        let other: BucketId = f.buckets.allocate();
        let bucket = f.buckets.get_mut(f.id);

        bucket.set_next(Some(other));
        assert_eq!(bucket.link(), BucketLink::Next(other));
        assert_eq!(bucket.next(), Some(other));

        bucket.set_link(BucketLink::Detached);
        assert!(bucket.is_detached());
        assert_eq!(bucket.next(), None);

        bucket.reset();
        assert_eq!(bucket.link(), BucketLink::None);
        assert_eq!(bucket.capacity(), 0);
        assert!(!bucket.has_free_space());
    }
}
