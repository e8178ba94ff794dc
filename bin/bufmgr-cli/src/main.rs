// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # bufmgr
//!
//! Command-line interface for the bucketed buffer manager.
//!
//! ## Usage
//! ```bash
//! # Drive a random allocate/free workload and print the resulting stats
//! bufmgr simulate --bucket-size 64K --ops 100000 --max-size 4K
//!
//! # Same workload over four threads sharing one manager, as JSON
//! bufmgr simulate --threads 4 --json
//!
//! # Print the effective configuration
//! bufmgr --config bufmgr.toml config
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bufmgr",
    about = "Bucketed byte-buffer allocator driver",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (CLI arguments override it).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a seeded random allocate/free workload against a manager.
    Simulate {
        /// Bucket size (e.g., "64K", "1M"). Also the largest buffer.
        #[arg(short = 'b', long)]
        bucket_size: Option<String>,

        /// Bucket records minted per pool burst.
        #[arg(long)]
        bucket_burst: Option<usize>,

        /// Range records minted per pool burst.
        #[arg(long)]
        buffer_burst: Option<usize>,

        /// Number of allocate/free steps per thread.
        #[arg(short, long, default_value_t = 10_000)]
        ops: usize,

        /// Largest buffer requested (e.g., "4K"). Defaults to the bucket size.
        #[arg(short, long)]
        max_size: Option<String>,

        /// Workload seed.
        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Threads sharing one synchronized manager.
        #[arg(short, long, default_value_t = 1)]
        threads: usize,

        /// Print the report as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate {
            bucket_size,
            bucket_burst,
            buffer_burst,
            ops,
            max_size,
            seed,
            threads,
            json,
        } => {
            let mut config = config;
            if let Some(size) = bucket_size {
                config.bucket_size = size;
            }
            if let Some(burst) = bucket_burst {
                config.bucket_burst = burst;
            }
            if let Some(burst) = buffer_burst {
                config.buffer_burst = burst;
            }
            let options = commands::simulate::Options {
                ops,
                max_size,
                seed,
                threads,
                json,
            };
            commands::simulate::execute(config, options)
        }
        Commands::Config => commands::config::execute(&config),
    }
}
