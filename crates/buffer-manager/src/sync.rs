// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Mutex-guarded facade over [`BufferManager`].
//!
//! A single lock covers the manager and both record pools it owns; the
//! pools are never locked on their own. Each call takes the lock for its
//! own duration and releases it before returning, so there is no lock
//! ordering to get wrong.
//!
//! The lock protects the allocator's bookkeeping, not buffer contents:
//! byte access goes through [`with_data`](SyncBufferManager::with_data) and
//! [`with_data_mut`](SyncBufferManager::with_data_mut), which hold the lock
//! only while the closure runs.

use crate::{
    BucketId, Buffer, BufferError, BufferGuard, BufferManager, BufferManagerConfig,
    BufferManagerStats,
};
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard};

/// A cloneable, thread-safe handle to one [`BufferManager`].
///
/// # Example
/// ```
/// use buffer_manager::SyncBufferManager;
///
/// let manager = SyncBufferManager::new(4096, 4, 64).unwrap();
/// let workers: Vec<_> = (0..4)
///     .map(|_| {
///         let manager = manager.clone();
///         std::thread::spawn(move || {
///             let buf = manager.allocate(128).unwrap();
///             manager.free(buf);
///         })
///     })
///     .collect();
/// for w in workers {
///     w.join().unwrap();
/// }
/// assert_eq!(manager.stats().allocated_bytes, 0);
/// ```
#[derive(Clone)]
pub struct SyncBufferManager {
    inner: Arc<Mutex<BufferManager>>,
    /// Immutable after construction, so it is read without the lock.
    bucket_size: usize,
}

impl SyncBufferManager {
    /// Creates a shared manager. See [`BufferManager::new`].
    pub fn new(
        bucket_size: usize,
        bucket_burst: usize,
        buffer_burst: usize,
    ) -> Result<Self, BufferError> {
        Ok(Self::from_manager(BufferManager::new(
            bucket_size,
            bucket_burst,
            buffer_burst,
        )?))
    }

    /// Creates a shared manager from a parsed configuration.
    pub fn from_config(config: &BufferManagerConfig) -> Result<Self, BufferError> {
        Ok(Self::from_manager(BufferManager::from_config(config)?))
    }

    /// Wraps an existing manager.
    pub fn from_manager(manager: BufferManager) -> Self {
        Self {
            bucket_size: manager.bucket_size(),
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    /// See [`BufferManager::bucket_size`].
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// See [`BufferManager::allocate`].
    pub fn allocate(&self, size: usize) -> Result<Buffer, BufferError> {
        self.lock().allocate(size)
    }

    /// Allocates a buffer wrapped in a guard that frees it on drop.
    pub fn allocate_guard(&self, size: usize) -> Result<BufferGuard, BufferError> {
        let buffer = self.allocate(size)?;
        Ok(BufferGuard::new(buffer, self.clone()))
    }

    /// See [`BufferManager::free`].
    pub fn free(&self, buffer: Buffer) {
        self.lock().free(buffer);
    }

    /// See [`BufferManager::stats`].
    pub fn stats(&self) -> BufferManagerStats {
        self.lock().stats()
    }

    /// See [`BufferManager::shrink`].
    pub fn shrink(&self) -> usize {
        self.lock().shrink()
    }

    /// Runs `f` over the buffer's bytes while holding the lock.
    pub fn with_data<R>(&self, buffer: &Buffer, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.lock().data(buffer))
    }

    /// Runs `f` over the buffer's bytes mutably while holding the lock.
    pub fn with_data_mut<R>(&self, buffer: &mut Buffer, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(self.lock().data_mut(buffer))
    }

    /// See [`BufferManager::buckets_with_space`].
    pub fn buckets_with_space(&self) -> Vec<BucketId> {
        self.lock().buckets_with_space()
    }

    /// See [`BufferManager::free_ranges`].
    pub fn free_ranges(&self, bucket: BucketId) -> Vec<Range<usize>> {
        self.lock().free_ranges(bucket)
    }

    /// See [`BufferManager::check_partition`].
    pub fn check_partition<'a, I>(&self, in_use: I) -> Result<(), BufferError>
    where
        I: IntoIterator<Item = &'a Buffer>,
    {
        self.lock().check_partition(in_use)
    }

    /// Frees from a guard's `Drop`. A poisoned lock is skipped rather than
    /// turned into a second panic during unwinding.
    pub(crate) fn release_on_drop(&self, buffer: Buffer) {
        if let Ok(mut manager) = self.inner.lock() {
            manager.free(buffer);
        }
    }

    // A panic under the lock means an allocator invariant broke; poisoning
    // is propagated.
    fn lock(&self) -> MutexGuard<'_, BufferManager> {
        self.inner
            .lock()
            .expect("buffer manager lock poisoned by a panicking holder")
    }
}

impl std::fmt::Debug for SyncBufferManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Ok(manager) => f.debug_tuple("SyncBufferManager").field(&*manager).finish(),
            Err(_) => f.write_str("SyncBufferManager(<locked>)"),
        }
    }
}
