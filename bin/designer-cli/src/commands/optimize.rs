// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `lns-designer optimize` command: search for a partitioning plan.
//!
//! Runs the full type-state pipeline:
//! ```text
//! Designer<Idle> → load_inputs → <Loaded> → run → DesignOutput
//! ```

use super::{base_config, format_bytes, truncate, InputArgs};
use designer::{DesignOutput, Designer};
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Memory budget per partition (e.g., "512M", "unbounded").
    #[arg(short = 'b', long)]
    pub memory_budget: Option<String>,

    /// Strategy: lns, most-popular, branch-and-bound.
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Where the LNS search checkpoints (and resumes from).
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Where the final plan is written as JSON.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Global time limit in seconds.
    #[arg(long)]
    pub time_limit: Option<u64>,

    /// Maximum number of LNS restarts.
    #[arg(long)]
    pub restarts: Option<u32>,

    /// Backtrack limit per local search.
    #[arg(long)]
    pub back_tracks: Option<u64>,

    /// Seed for the relaxation RNG.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub async fn execute(config_file: Option<PathBuf>, args: OptimizeArgs) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           lns-designer · Plan Optimizer              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Configuration ──────────────────────────────────────────
    let mut config = base_config(config_file, args.inputs)?;
    if let Some(budget) = args.memory_budget {
        config.memory_budget = budget;
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if args.checkpoint.is_some() {
        config.checkpoint_path = args.checkpoint;
    }
    if args.output.is_some() {
        config.output_path = args.output;
    }
    if args.time_limit.is_some() {
        config.hints.limit_total_time = args.time_limit;
    }
    if args.restarts.is_some() {
        config.hints.limit_restarts = args.restarts;
    }
    if args.back_tracks.is_some() {
        config.hints.limit_back_tracks = args.back_tracks;
    }
    if args.seed.is_some() {
        config.hints.random_seed = args.seed;
    }

    tracing::debug!("resolved config: {config:?}");

    println!("  Config:");
    println!("   Catalog:    {}", config.catalog_path.display());
    println!("   Workload:   {}", config.workload_path.display());
    if let Some(path) = &config.correlations_path {
        println!("   Correl.:    {}", path.display());
    }
    println!("   Budget:     {}", config.memory_budget);
    println!("   Strategy:   {}", config.strategy);
    if let Some(path) = &config.checkpoint_path {
        println!("   Checkpoint: {}", path.display());
    }
    println!();

    // Step 1: Idle → Loaded.
    println!("  [1/2] Loading catalog, workload and correlations...");
    let loaded = Designer::new(config).load_inputs()?;
    println!("        {}", loaded.context().catalog.summary());
    println!(
        "        {} transactions, {} correlations",
        loaded.context().workload.len(),
        loaded.context().correlations.len(),
    );
    println!();

    // Step 2: search.
    println!("  [2/2] Searching...");
    let output = loaded.run().await?;
    println!();

    print_results(&output);
    Ok(())
}

fn print_results(output: &DesignOutput) {
    let m = &output.metrics;
    println!("  Results:");
    println!("   {}", m.summary());
    println!("   Memory: {} per partition", format_bytes(m.memory_bytes));
    println!();

    if !m.rounds.is_empty() {
        println!(
            "  {:>7} {:>6} {:>14} {:>14} {:>8} {:>9} {:>10}",
            "Restart", "Relax", "Cost", "Best", "Accept", "Nodes", "Time",
        );
        println!("  {}", "-".repeat(74));
        for r in &m.rounds {
            println!(
                "  {:>7} {:>6} {:>14.6} {:>14.6} {:>8} {:>9} {:>8.2}ms",
                r.restart,
                r.relax_size,
                r.cost,
                r.best_cost,
                if r.accepted { "yes" } else { "-" },
                r.nodes,
                r.duration.as_secs_f64() * 1000.0,
            );
        }
        println!();
    }

    println!("  Plan:");
    for (table, attribute) in &output.plan.tables {
        println!("   {:<24} {}", truncate(table, 24), attribute);
    }
    for (procedure, parameter) in &output.plan.procedures {
        let routed = output
            .catalog
            .procedure(procedure)
            .map(|p| p.single_partition)
            .unwrap_or(false);
        println!(
            "   {:<24} {:<12} {}",
            truncate(procedure, 24),
            parameter.to_string(),
            if routed { "single-partition" } else { "distributed" },
        );
    }
    println!();
}
