// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # lns-designer
//!
//! Command-line interface for the LNS partitioning-plan designer.
//!
//! ## Usage
//! ```bash
//! # Search for a plan
//! lns-designer optimize --catalog ./tpcc/catalog.json --workload ./tpcc/workload.json \
//!     --correlations ./tpcc/correlations.json --memory-budget 512M --time-limit 600
//!
//! # Same, with everything in a TOML file
//! lns-designer --config ./tpcc/designer.toml optimize
//!
//! # Compare strategies across memory budgets
//! lns-designer benchmark --catalog ./tpcc/catalog.json --workload ./tpcc/workload.json \
//!     --sweep-memory 64M,256M,unbounded
//!
//! # Inspect a catalog and its workload
//! lns-designer inspect --catalog ./tpcc/catalog.json --workload ./tpcc/workload.json
//!
//! # Show where a checkpointed search stands
//! lns-designer checkpoint ./tpcc/lns.checkpoint
//! ```

mod commands;

use clap::{Parser, Subcommand};
use commands::optimize::OptimizeArgs;

#[derive(Parser)]
#[command(
    name = "lns-designer",
    about = "Partitioning-plan designer for partitioned in-memory databases",
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
    /// Search for a partitioning plan.
    Optimize(OptimizeArgs),

    /// Run several strategies across several memory budgets.
    Benchmark {
        #[command(flatten)]
        inputs: commands::InputArgs,

        /// Comma-separated memory budgets to sweep (e.g., "64M,256M,unbounded").
        #[arg(long, default_value = "unbounded")]
        sweep_memory: String,

        /// Strategies to benchmark (comma-separated).
        #[arg(long, default_value = "most-popular,branch-and-bound,lns")]
        strategies: String,

        /// LNS restarts per run.
        #[arg(long, default_value_t = 10)]
        restarts: u32,
    },

    /// Inspect a catalog: tables, sizes, procedures and workload coverage.
    Inspect {
        /// Path to the JSON catalog manifest.
        #[arg(long)]
        catalog: std::path::PathBuf,

        /// Path to a JSON workload trace.
        #[arg(long)]
        workload: Option<std::path::PathBuf>,
    },

    /// Summarise a saved LNS checkpoint.
    Checkpoint {
        /// Path to the checkpoint file.
        path: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Optimize(args) => commands::optimize::execute(cli.config, args).await,
        Commands::Benchmark {
            inputs,
            sweep_memory,
            strategies,
            restarts,
        } => {
            commands::benchmark::execute(cli.config, inputs, sweep_memory, strategies, restarts)
                .await
        }
        Commands::Inspect { catalog, workload } => commands::inspect::execute(catalog, workload),
        Commands::Checkpoint { path } => commands::checkpoint::execute(path),
    }
}
