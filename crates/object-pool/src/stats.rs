// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pool accounting snapshot.

/// Point-in-time counters of an [`ObjectPool`](crate::ObjectPool).
///
/// `allocated <= reserved` always holds; the two are equal whenever the
/// free list is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    /// Records ever minted by the batch factory.
    pub reserved: usize,
    /// Records currently checked out.
    pub allocated: usize,
}

impl PoolStats {
    /// Records sitting on the free list.
    pub fn available(&self) -> usize {
        self.reserved - self.allocated
    }
}
