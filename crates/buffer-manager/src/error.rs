// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for buffer management.

/// Errors returned by the buffer manager and its configuration layer.
///
/// Capacity conditions (`Oversize`, `ZeroSizedAllocation`) are expected and
/// recoverable. Freeing a buffer into the wrong manager is a contract
/// violation and panics instead of producing one of these.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// The request cannot fit in a single bucket.
    #[error("requested {requested} bytes, but a buffer cannot exceed the bucket size of {bucket_size} bytes")]
    Oversize {
        requested: usize,
        bucket_size: usize,
    },

    /// Attempted to allocate a zero-sized buffer.
    #[error("cannot allocate zero-sized buffer")]
    ZeroSizedAllocation,

    /// A size argument or size string is invalid.
    #[error("invalid size: {0}")]
    InvalidSize(String),

    /// Configuration could not be read, parsed or serialised.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// An internal bookkeeping inconsistency was detected.
    #[error("buffer manager integrity error: {0}")]
    Corruption(String),
}
