// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # object-pool
//!
//! A batch-minting allocator for small fixed-shape records that recycles
//! them through an intrusive free list instead of returning them to the
//! heap.
//!
//! # Key Components
//!
//! - [`Recyclable`] — the capability every pooled record implements: an
//!   intrusive `next` link plus a `reset` back to a blank state.
//! - [`Handle`] — a typed index into a pool's arena. Links between records
//!   are handles, never pointers.
//! - [`ObjectPool`] — the single-threaded allocator. Records are minted in
//!   bursts of `burst_size` by a caller-supplied factory and never released
//!   back to the heap afterwards.
//! - [`SyncObjectPool`] — a mutex-guarded facade for shared use.
//!
//! # Lifecycle
//!
//! ```text
//!   factory(burst) ──► arena[base..base+n]  (chained via set_next)
//!                              │
//!   allocate() ◄── pop head ◄──┤◄── push head ◄── free(handle)
//!        │                     │
//!     reset()              available
//! ```
//!
//! # Example
//! ```
//! use object_pool::{Handle, ObjectPool, Recyclable};
//!
//! #[derive(Default)]
//! struct Slot {
//!     value: u64,
//!     next: Option<Handle<Slot>>,
//! }
//!
//! impl Recyclable for Slot {
//!     fn next(&self) -> Option<Handle<Self>> {
//!         self.next
//!     }
//!     fn set_next(&mut self, next: Option<Handle<Self>>) {
//!         self.next = next;
//!     }
//!     fn reset(&mut self) {
//!         *self = Slot::default();
//!     }
//! }
//!
//! let mut pool = ObjectPool::<Slot>::with_default_items(4);
//! let a = pool.allocate();
//! pool.get_mut(a).value = 7;
//! assert_eq!(pool.stats().reserved, 4);
//! assert_eq!(pool.stats().allocated, 1);
//!
//! pool.free(a);
//! assert_eq!(pool.stats().allocated, 0);
//! ```

mod handle;
mod item;
pub mod pool;
mod stats;
mod sync;

pub use handle::Handle;
pub use item::Recyclable;
pub use pool::{BatchFactory, ObjectPool};
pub use stats::PoolStats;
pub use sync::SyncObjectPool;
