// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # buffer-manager
//!
//! A variable-size byte-buffer allocator that partitions large fixed-size
//! blocks ("buckets") into reusable, splittable and coalescable ranges
//! ("buffers"). After warm-up it allocates nothing from the heap except
//! storage for new buckets.
//!
//! # Key Components
//!
//! - [`BufferManager`] — the allocator: first-fit search over the buckets
//!   that still have free space, bucket creation on exhaustion, and
//!   bucket detach/reattach as space is used and returned.
//! - [`Bucket`] — one storage block and the unordered free list of ranges
//!   describing its unused bytes. Splits on allocation, coalesces on
//!   release.
//! - [`Buffer`] — a caller-held `[start, start + size)` range of one bucket.
//! - [`SyncBufferManager`] / [`BufferGuard`] — a cloneable mutex-guarded
//!   facade and an RAII guard that frees on drop.
//! - [`BufferManagerStats`] — bucket, byte and pool counters.
//! - [`BufferManagerConfig`] / [`ByteSize`] — TOML configuration with
//!   human-readable sizes.
//! - [`workload`] — seeded random allocate/free request streams.
//!
//! # Ownership Model
//!
//! ```text
//!   BufferManager ── owns ──► ObjectPool<Bucket>       (bucket records + storage)
//!        │          └─ owns ──► ObjectPool<BufferRange>  (range records)
//!        │
//!   allocate(n) ──► Buffer { bucket id, range id, start, size }
//!                     │   (ids are indices, never pointers)
//!   free(buffer) ◄────┘
//! ```
//!
//! The manager is the only owner of buckets. Buffers and ranges name their
//! bucket by id, so there is no reference cycle between a bucket and the
//! ranges on its free list.
//!
//! # Example
//! ```
//! use buffer_manager::BufferManager;
//!
//! let mut manager = BufferManager::new(30, 1, 8).unwrap();
//!
//! let a = manager.allocate(10).unwrap();
//! let b = manager.allocate(10).unwrap();
//! let c = manager.allocate(10).unwrap();
//! assert_eq!((a.range(), b.range(), c.range()), (0..10, 10..20, 20..30));
//!
//! let bucket = a.bucket();
//! manager.free(b);
//! manager.free(a);
//! manager.free(c);
//! assert_eq!(manager.free_ranges(bucket), vec![0..30]);
//! ```

mod bucket;
mod buffer;
mod config;
mod error;
mod guard;
pub mod manager;
mod size;
mod stats;
mod sync;
pub mod workload;

pub use bucket::{Bucket, BucketId, BucketLink};
pub use buffer::Buffer;
pub use config::BufferManagerConfig;
pub use error::BufferError;
pub use guard::BufferGuard;
pub use manager::BufferManager;
pub use size::ByteSize;
pub use stats::BufferManagerStats;
pub use sync::SyncBufferManager;

pub use object_pool::PoolStats;
