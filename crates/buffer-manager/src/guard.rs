// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII buffer guard that frees its buffer on drop.
//!
//! [`BufferGuard`] pairs a [`Buffer`] with a handle to the
//! [`SyncBufferManager`] that produced it. Dropping the guard returns the
//! range to its bucket, so a forgotten `free` cannot leak bucket space.

use crate::{Buffer, SyncBufferManager};

/// An RAII guard around a buffer from a [`SyncBufferManager`].
///
/// # Example
/// ```
/// use buffer_manager::SyncBufferManager;
///
/// let manager = SyncBufferManager::new(1024, 2, 16).unwrap();
/// {
///     let mut guard = manager.allocate_guard(64).unwrap();
///     guard.with_bytes_mut(|b| b[0] = 7);
///     assert_eq!(guard.to_vec()[0], 7);
///     assert_eq!(manager.stats().allocated_bytes, 64);
/// }
/// assert_eq!(manager.stats().allocated_bytes, 0);
/// ```
pub struct BufferGuard {
    /// Wrapped in `Option` so we can `take()` it in `drop()`.
    buffer: Option<Buffer>,
    manager: SyncBufferManager,
}

impl BufferGuard {
    pub(crate) fn new(buffer: Buffer, manager: SyncBufferManager) -> Self {
        Self {
            buffer: Some(buffer),
            manager,
        }
    }

    /// The guarded buffer.
    pub fn buffer(&self) -> &Buffer {
        self.buffer.as_ref().expect("buffer already consumed")
    }

    /// Size of the guarded buffer in bytes.
    pub fn size(&self) -> usize {
        self.buffer().size()
    }

    /// Runs `f` over the buffer's bytes.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.manager.with_data(self.buffer(), f)
    }

    /// Runs `f` over the buffer's bytes mutably.
    pub fn with_bytes_mut<R>(&mut self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let buffer = self.buffer.as_mut().expect("buffer already consumed");
        self.manager.with_data_mut(buffer, f)
    }

    /// Copies the buffer's bytes out.
    pub fn to_vec(&self) -> Vec<u8> {
        self.with_bytes(|bytes| bytes.to_vec())
    }

    /// Detaches the buffer from the guard without freeing it. The caller
    /// becomes responsible for [`SyncBufferManager::free`].
    pub fn into_buffer(mut self) -> Buffer {
        self.buffer.take().expect("buffer already consumed")
    }
}

impl Drop for BufferGuard {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.manager.release_on_drop(buffer);
        }
    }
}

impl std::fmt::Debug for BufferGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferGuard")
            .field("buffer", &self.buffer)
            .finish()
    }
}
