// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Buffer manager configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! bucket_size = "64K"
//! bucket_burst = 4
//! buffer_burst = 64
//! synchronized = false
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use crate::{BufferError, BufferManager, ByteSize, SyncBufferManager};
use std::path::Path;

/// The three tunables of a buffer manager, plus whether callers want the
/// synchronized facade.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BufferManagerConfig {
    /// Bucket size (human-readable, e.g. `"64K"`). Also the largest buffer.
    #[serde(default = "default_bucket_size")]
    pub bucket_size: String,
    /// How many bucket records the bucket pool mints per burst.
    #[serde(default = "default_bucket_burst")]
    pub bucket_burst: usize,
    /// How many range records the range pool mints per burst.
    #[serde(default = "default_buffer_burst")]
    pub buffer_burst: usize,
    /// Whether the manager will be shared between threads.
    #[serde(default)]
    pub synchronized: bool,
}

fn default_bucket_size() -> String {
    "64K".to_string()
}

fn default_bucket_burst() -> usize {
    4
}

fn default_buffer_burst() -> usize {
    64
}

impl BufferManagerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, BufferError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BufferError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, BufferError> {
        toml::from_str(toml_str)
            .map_err(|e| BufferError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, BufferError> {
        toml::to_string_pretty(self)
            .map_err(|e| BufferError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Parses the bucket size string.
    pub fn parse_bucket_size(&self) -> Result<ByteSize, BufferError> {
        ByteSize::parse(&self.bucket_size)
    }

    /// Builds a single-threaded manager.
    pub fn build(&self) -> Result<BufferManager, BufferError> {
        BufferManager::from_config(self)
    }

    /// Builds a synchronized manager.
    pub fn build_sync(&self) -> Result<SyncBufferManager, BufferError> {
        SyncBufferManager::from_config(self)
    }
}

impl Default for BufferManagerConfig {
    fn default() -> Self {
        Self {
            bucket_size: default_bucket_size(),
            bucket_burst: default_bucket_burst(),
            buffer_burst: default_buffer_burst(),
            synchronized: false,
        }
    }
}
