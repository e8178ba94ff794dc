// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The capability shared by every pooled record.

use crate::Handle;

/// A record that can sit on an intrusive singly-linked free list and be
/// wiped back to a blank state.
///
/// The `next` link is non-owning: it names another record of the same kind
/// living in the same pool arena, or nothing.
pub trait Recyclable: Sized {
    /// Returns the record linked after this one, if any.
    fn next(&self) -> Option<Handle<Self>>;

    /// Replaces the link to the following record.
    fn set_next(&mut self, next: Option<Handle<Self>>);

    /// Clears every field to its zero value, including the `next` link.
    fn reset(&mut self);
}
