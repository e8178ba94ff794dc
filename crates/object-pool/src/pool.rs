// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Burst-minting object pool with an intrusive free list.
//!
//! The [`ObjectPool`] owns an arena of records and a free list threaded
//! through the records' own `next` links. It:
//!
//! 1. Mints records in bursts of `burst_size` via a caller-supplied batch
//!    factory whenever the free list runs dry.
//! 2. Hands records out by popping the free-list head (`O(1)`), resetting
//!    them on the way out.
//! 3. Takes records back by pushing them onto the head (`O(1)`). The reset
//!    is deferred until the record is handed out again.
//!
//! Minted records are never released to the heap; the arena only grows.
//!
//! # Thread Safety
//! `ObjectPool` is single-threaded and takes `&mut self` everywhere. Wrap it
//! in a [`SyncObjectPool`](crate::SyncObjectPool) to share it.

use crate::{Handle, PoolStats, Recyclable};
use std::fmt;

/// Produces `count` fresh records in one call.
///
/// Returning an empty batch is a contract violation and panics inside
/// [`ObjectPool::allocate`].
pub type BatchFactory<T> = Box<dyn FnMut(usize) -> Vec<T> + Send>;

/// A free-list allocator for fixed-shape [`Recyclable`] records.
///
/// # Example
/// ```
/// use object_pool::{Handle, ObjectPool, Recyclable};
///
/// struct Node {
///     next: Option<Handle<Node>>,
/// }
///
/// impl Recyclable for Node {
///     fn next(&self) -> Option<Handle<Self>> { self.next }
///     fn set_next(&mut self, next: Option<Handle<Self>>) { self.next = next; }
///     fn reset(&mut self) { self.next = None; }
/// }
///
/// let mut pool = ObjectPool::new(4, |n| (0..n).map(|_| Node { next: None }).collect());
/// let handles: Vec<_> = (0..5).map(|_| pool.allocate()).collect();
/// assert_eq!(pool.stats().reserved, 8);
/// assert_eq!(pool.stats().allocated, 5);
///
/// for h in handles {
///     pool.free(h);
/// }
/// assert_eq!(pool.stats().allocated, 0);
/// ```
pub struct ObjectPool<T> {
    /// Every record ever minted, indexed by [`Handle::index`].
    items: Vec<T>,
    /// Parallel to `items`: true while the record is checked out.
    checked_out: Vec<bool>,
    /// Head of the free list.
    available: Option<Handle<T>>,
    /// Number of records requested from the factory per burst.
    burst_size: usize,
    factory: BatchFactory<T>,
    reserved: usize,
    allocated: usize,
}

impl<T: Recyclable> ObjectPool<T> {
    /// Creates an empty pool. Nothing is minted until the first
    /// [`allocate`](Self::allocate).
    ///
    /// Any `burst_size` is accepted, zero included. The factory is
    /// asked for that many records on each burst; if it hands back none,
    /// `allocate` panics.
    pub fn new<F>(burst_size: usize, factory: F) -> Self
    where
        F: FnMut(usize) -> Vec<T> + Send + 'static,
    {
        Self {
            items: Vec::new(),
            checked_out: Vec::new(),
            available: None,
            burst_size,
            factory: Box::new(factory),
            reserved: 0,
            allocated: 0,
        }
    }

    /// Creates a pool whose factory mints `T::default()` records.
    pub fn with_default_items(burst_size: usize) -> Self
    where
        T: Default + 'static,
    {
        Self::new(burst_size, |count| {
            (0..count).map(|_| T::default()).collect()
        })
    }

    /// Checks a record out of the pool, minting a new burst first if the
    /// free list is empty. The returned record has just been reset.
    ///
    /// # Panics
    /// Panics if the batch factory returns an empty batch, which is what
    /// [`with_default_items`](Self::with_default_items) does for a zero
    /// `burst_size`.
    pub fn allocate(&mut self) -> Handle<T> {
        let head = match self.available {
            Some(head) => head,
            None => self.mint_burst(),
        };

        let item = &mut self.items[head.index()];
        self.available = item.next();
        item.reset();
        self.checked_out[head.index()] = true;
        self.allocated += 1;
        head
    }

    /// Returns a record to the head of the free list.
    ///
    /// The record is not reset here; that happens on its next
    /// [`allocate`](Self::allocate).
    ///
    /// # Panics
    /// Panics if `handle` is outside this pool's arena or if the record is
    /// not currently checked out (a double free).
    pub fn free(&mut self, handle: Handle<T>) {
        let index = self.checked_index(handle);
        assert!(
            self.checked_out[index],
            "double free of {handle:?}: the record is not checked out"
        );

        self.checked_out[index] = false;
        self.items[index].set_next(self.available);
        self.available = Some(handle);
        self.allocated -= 1;
    }

    /// Returns the record behind `handle`.
    ///
    /// # Panics
    /// Panics if `handle` is outside this pool's arena.
    pub fn get(&self, handle: Handle<T>) -> &T {
        &self.items[self.checked_index(handle)]
    }

    /// Returns the record behind `handle` mutably.
    ///
    /// # Panics
    /// Panics if `handle` is outside this pool's arena.
    pub fn get_mut(&mut self, handle: Handle<T>) -> &mut T {
        let index = self.checked_index(handle);
        &mut self.items[index]
    }

    /// Returns a snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            reserved: self.reserved,
            allocated: self.allocated,
        }
    }

    /// Returns the configured burst size.
    pub fn burst_size(&self) -> usize {
        self.burst_size
    }

    /// Mints one burst, chains it, and installs it as the free list.
    /// Returns the new head.
    fn mint_burst(&mut self) -> Handle<T> {
        debug_assert_eq!(
            self.allocated, self.reserved,
            "free list is empty but not every record is checked out"
        );

        let batch = (self.factory)(self.burst_size);
        assert!(
            !batch.is_empty(),
            "batch factory returned no records for a burst of {}",
            self.burst_size
        );

        let base = self.items.len();
        let count = batch.len();
        self.items.extend(batch);
        self.checked_out.resize(base + count, false);
        for offset in 0..count {
            let next = (offset + 1 < count).then(|| Handle::new(base + offset + 1));
            self.items[base + offset].set_next(next);
        }
        self.reserved += count;

        tracing::debug!(
            "object pool minted {count} records (reserved {}, allocated {})",
            self.reserved,
            self.allocated,
        );

        let head = Handle::new(base);
        self.available = Some(head);
        head
    }

    fn checked_index(&self, handle: Handle<T>) -> usize {
        assert!(
            handle.index() < self.items.len(),
            "{handle:?} does not belong to this pool ({} records minted)",
            self.items.len()
        );
        handle.index()
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("burst_size", &self.burst_size)
            .field("reserved", &self.reserved)
            .field("allocated", &self.allocated)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Minimal recyclable record used across the crate's tests.
    #[derive(Debug, Default)]
    pub(crate) struct Slot {
        pub(crate) value: u64,
        pub(crate) next: Option<Handle<Slot>>,
    }

    impl Recyclable for Slot {
        fn next(&self) -> Option<Handle<Self>> {
            self.next
        }

        fn set_next(&mut self, next: Option<Handle<Self>>) {
            self.next = next;
        }

        fn reset(&mut self) {
            self.value = 0;
            self.next = None;
        }
    }

    #[test]
    fn test_zero_burst_constructs() {
        let pool = ObjectPool::<Slot>::with_default_items(0);
        assert_eq!(pool.burst_size(), 0);
        assert_eq!(pool.stats(), PoolStats::default());
    }

    #[test]
    #[should_panic(expected = "batch factory returned no records")]
    fn test_zero_burst_panics_on_allocate() {
        let mut pool = ObjectPool::<Slot>::with_default_items(0);
        pool.allocate();
    }

    #[test]
    fn test_zero_burst_with_generous_factory() {
        // The factory decides how many records a burst really holds.
        let mut pool = ObjectPool::new(0, |_| vec![Slot::default(), Slot::default()]);
        pool.allocate();
        assert_eq!(pool.stats().reserved, 2);
    }

    #[test]
    fn test_nothing_minted_before_first_allocate() {
        let pool = ObjectPool::<Slot>::with_default_items(4);
        assert_eq!(pool.stats(), PoolStats::default());
    }

    #[test]
    fn test_burst_accounting() {
        let mut pool = ObjectPool::<Slot>::with_default_items(4);

        let handles: Vec<_> = (0..5).map(|_| pool.allocate()).collect();
        assert_eq!(pool.stats().reserved, 8);
        assert_eq!(pool.stats().allocated, 5);

        for h in handles.into_iter().take(3) {
            pool.free(h);
        }
        assert_eq!(pool.stats().reserved, 8);
        assert_eq!(pool.stats().allocated, 2);
        assert_eq!(pool.stats().available(), 6);
    }

    #[test]
    fn test_factory_called_per_burst() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut pool = ObjectPool::new(3, move |n| {
            counter.fetch_add(1, Ordering::Relaxed);
            (0..n).map(|_| Slot::default()).collect()
        });

        for _ in 0..3 {
            pool.allocate();
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        pool.allocate();
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert_eq!(pool.stats().reserved, 6);
    }

    #[test]
    fn test_short_batch_counts_actual_records() {
        let mut pool = ObjectPool::new(8, |_| vec![Slot::default(), Slot::default()]);
        pool.allocate();
        assert_eq!(pool.stats().reserved, 2);
        pool.allocate();
        pool.allocate();
        assert_eq!(pool.stats().reserved, 4);
    }

    #[test]
    fn test_free_is_lifo() {
        let mut pool = ObjectPool::<Slot>::with_default_items(4);
        let a = pool.allocate();
        let b = pool.allocate();
        pool.free(a);
        pool.free(b);

        // Most recently freed comes back first.
        assert_eq!(pool.allocate(), b);
        assert_eq!(pool.allocate(), a);
    }

    #[test]
    fn test_allocate_resets_record() {
        let mut pool = ObjectPool::<Slot>::with_default_items(2);
        let a = pool.allocate();
        pool.get_mut(a).value = 99;
        pool.free(a);

        // Reset is deferred until the next allocate.
        assert_eq!(pool.get(a).value, 99);

        let again = pool.allocate();
        assert_eq!(again, a);
        assert_eq!(pool.get(again).value, 0);
        assert!(pool.get(again).next.is_none());
    }

    #[test]
    fn test_handles_are_distinct() {
        let mut pool = ObjectPool::<Slot>::with_default_items(3);
        let mut seen: Vec<_> = (0..10).map(|_| pool.allocate().index()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 10);
    }

    #[test]
    #[should_panic(expected = "batch factory returned no records")]
    fn test_empty_factory_batch_panics() {
        let mut pool = ObjectPool::new(4, |_| Vec::<Slot>::new());
        pool.allocate();
    }

    #[test]
    #[should_panic(expected = "does not belong to this pool")]
    fn test_foreign_handle_panics() {
        let mut small = ObjectPool::<Slot>::with_default_items(1);
        let mut large = ObjectPool::<Slot>::with_default_items(8);
        let _ = small.allocate();
        let foreign = (0..5).map(|_| large.allocate()).last().unwrap();
        small.free(foreign);
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn test_double_free_panics() {
        let mut pool = ObjectPool::<Slot>::with_default_items(2);
        let a = pool.allocate();
        pool.free(a);
        pool.free(a);
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn test_double_free_with_other_records_outstanding_panics() {
        let mut pool = ObjectPool::<Slot>::with_default_items(4);
        let a = pool.allocate();
        let _b = pool.allocate();
        pool.free(a);
        // Would otherwise link `a` to itself and hand it out twice.
        pool.free(a);
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn test_free_of_never_allocated_record_panics() {
        let mut pool = ObjectPool::<Slot>::with_default_items(4);
        let a = pool.allocate();
        // Minted in the same burst but still on the free list.
        let sibling = Handle::new(a.index() + 1);
        pool.free(sibling);
    }

    #[test]
    fn test_refree_after_reallocate_is_allowed() {
        let mut pool = ObjectPool::<Slot>::with_default_items(2);
        let a = pool.allocate();
        pool.free(a);
        let again = pool.allocate();
        assert_eq!(again, a);
        pool.free(again);
        assert_eq!(pool.stats().allocated, 0);
    }

    #[test]
    fn test_debug_format() {
        let pool = ObjectPool::<Slot>::with_default_items(4);
        let debug = format!("{pool:?}");
        assert!(debug.contains("ObjectPool"));
        assert!(debug.contains("burst_size: 4"));
    }
}
