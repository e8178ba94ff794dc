// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Mutex-guarded facade over [`ObjectPool`].
//!
//! Every operation takes the lock for its own duration only. Record
//! contents are reached through closures so that no reference outlives the
//! lock.

use crate::{Handle, ObjectPool, PoolStats, Recyclable};
use std::sync::{Mutex, MutexGuard};

/// An [`ObjectPool`] that can be shared between threads.
///
/// # Example
/// ```
/// use object_pool::{Handle, Recyclable, SyncObjectPool};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Job {
///     id: u32,
///     next: Option<Handle<Job>>,
/// }
///
/// impl Recyclable for Job {
///     fn next(&self) -> Option<Handle<Self>> { self.next }
///     fn set_next(&mut self, next: Option<Handle<Self>>) { self.next = next; }
///     fn reset(&mut self) { *self = Job::default(); }
/// }
///
/// let pool = Arc::new(SyncObjectPool::<Job>::with_default_items(16));
/// let worker = {
///     let pool = Arc::clone(&pool);
///     std::thread::spawn(move || {
///         let h = pool.allocate();
///         pool.with_item_mut(h, |job| job.id = 1);
///         h
///     })
/// };
/// let h = worker.join().unwrap();
/// assert_eq!(pool.with_item(h, |job| job.id), 1);
/// pool.free(h);
/// ```
pub struct SyncObjectPool<T> {
    inner: Mutex<ObjectPool<T>>,
}

impl<T: Recyclable> SyncObjectPool<T> {
    /// Creates a shared pool. See [`ObjectPool::new`].
    pub fn new<F>(burst_size: usize, factory: F) -> Self
    where
        F: FnMut(usize) -> Vec<T> + Send + 'static,
    {
        Self::from_pool(ObjectPool::new(burst_size, factory))
    }

    /// Creates a shared pool of `T::default()` records.
    pub fn with_default_items(burst_size: usize) -> Self
    where
        T: Default + 'static,
    {
        Self::from_pool(ObjectPool::with_default_items(burst_size))
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: ObjectPool<T>) -> Self {
        Self {
            inner: Mutex::new(pool),
        }
    }

    /// See [`ObjectPool::allocate`].
    pub fn allocate(&self) -> Handle<T> {
        self.lock().allocate()
    }

    /// See [`ObjectPool::free`].
    pub fn free(&self, handle: Handle<T>) {
        self.lock().free(handle);
    }

    /// See [`ObjectPool::stats`].
    pub fn stats(&self) -> PoolStats {
        self.lock().stats()
    }

    /// Runs `f` against the record behind `handle` while holding the lock.
    pub fn with_item<R>(&self, handle: Handle<T>, f: impl FnOnce(&T) -> R) -> R {
        f(self.lock().get(handle))
    }

    /// Runs `f` against the record behind `handle` mutably while holding
    /// the lock.
    pub fn with_item_mut<R>(&self, handle: Handle<T>, f: impl FnOnce(&mut T) -> R) -> R {
        f(self.lock().get_mut(handle))
    }

    /// Unwraps the inner single-threaded pool.
    pub fn into_inner(self) -> ObjectPool<T> {
        self.inner
            .into_inner()
            .expect("object pool lock poisoned by a panicking holder")
    }

    // A panic while the lock is held means a pool invariant was violated,
    // so poisoning is propagated rather than recovered from.
    fn lock(&self) -> MutexGuard<'_, ObjectPool<T>> {
        self.inner
            .lock()
            .expect("object pool lock poisoned by a panicking holder")
    }
}

impl<T> std::fmt::Debug for SyncObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Ok(pool) => f.debug_tuple("SyncObjectPool").field(&*pool).finish(),
            Err(_) => f.write_str("SyncObjectPool(<locked>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::tests::Slot;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_burst_constructs() {
        let pool = SyncObjectPool::<Slot>::with_default_items(0);
        assert_eq!(pool.stats(), PoolStats::default());
    }

    #[test]
    #[should_panic(expected = "batch factory returned no records")]
    fn test_zero_burst_panics_on_allocate() {
        let pool = SyncObjectPool::<Slot>::with_default_items(0);
        pool.allocate();
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn test_double_free_panics() {
        let pool = SyncObjectPool::<Slot>::with_default_items(4);
        let a = pool.allocate();
        let _b = pool.allocate();
        pool.free(a);
        pool.free(a);
    }

    #[test]
    fn test_single_thread_accounting() {
        let pool = SyncObjectPool::<Slot>::with_default_items(4);
        let handles: Vec<_> = (0..5).map(|_| pool.allocate()).collect();
        assert_eq!(pool.stats(), PoolStats { reserved: 8, allocated: 5 });

        for h in handles {
            pool.free(h);
        }
        assert_eq!(pool.stats(), PoolStats { reserved: 8, allocated: 0 });
    }

    #[test]
    fn test_item_access() {
        let pool = SyncObjectPool::<Slot>::with_default_items(2);
        let h = pool.allocate();
        pool.with_item_mut(h, |slot| slot.value = 41);
        assert_eq!(pool.with_item(h, |slot| slot.value + 1), 42);
    }

    #[test]
    fn test_concurrent_allocate_free() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 500;

        let pool = Arc::new(SyncObjectPool::<Slot>::with_default_items(7));
        let workers: Vec<_> = (0..THREADS)
            .map(|t| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let mut held = Vec::new();
                    for round in 0..ROUNDS {
                        let h = pool.allocate();
                        pool.with_item_mut(h, |slot| slot.value = (t * ROUNDS + round) as u64);
                        held.push(h);
                        if round % 3 == 0 {
                            pool.free(held.remove(0));
                        }
                    }
                    // Every record still held must carry the value this thread wrote.
                    for h in &held {
                        let v = pool.with_item(*h, |slot| slot.value) as usize;
                        assert_eq!(v / ROUNDS, t);
                    }
                    held.len()
                })
            })
            .collect();

        let outstanding: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
        let stats = pool.stats();
        assert_eq!(stats.allocated, outstanding);
        assert!(stats.allocated <= stats.reserved);
        assert_eq!(stats.reserved % 7, 0);
    }

    #[test]
    fn test_into_inner() {
        let pool = SyncObjectPool::<Slot>::with_default_items(2);
        pool.allocate();
        let inner = pool.into_inner();
        assert_eq!(inner.stats().allocated, 1);
    }
}
