// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `bufmgr config` command: print the effective configuration.

use buffer_manager::BufferManagerConfig;

pub fn execute(config: &BufferManagerConfig) -> anyhow::Result<()> {
    // Fail early on an unusable size rather than printing it back.
    let bucket_size = config.parse_bucket_size()?;
    tracing::debug!(bytes = bucket_size.as_bytes(), "bucket size resolved");

    print!("{}", config.to_toml()?);
    Ok(())
}
