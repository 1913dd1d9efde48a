// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `lns-designer benchmark` command: sweep across memory budgets and strategies.
//!
//! Runs a design with every combination and prints a comparison table of
//! final cost, improvement over the catalog's current plan, memory and time.

use super::{base_config, format_bytes, InputArgs};
use designer::{Designer, DesignerConfig};
use memory_estimator::MemoryBudget;
use std::cmp::Ordering;
use std::path::PathBuf;

pub async fn execute(
    config_file: Option<PathBuf>,
    inputs: InputArgs,
    sweep_memory: String,
    strategies_str: String,
    restarts: u32,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           lns-designer · Benchmark Suite             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let base = base_config(config_file, inputs)?;

    // Parse comma-separated memory budgets.
    let budgets: Vec<MemoryBudget> = sweep_memory
        .split(',')
        .map(|s| {
            MemoryBudget::parse(s.trim())
                .map_err(|e| anyhow::anyhow!("invalid budget '{}': {e}", s.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Parse comma-separated strategy names.
    let strategy_names: Vec<&str> = strategies_str.split(',').map(|s| s.trim()).collect();

    println!(
        "  Budgets:    {:?}",
        budgets.iter().map(|b| format!("{b}")).collect::<Vec<_>>(),
    );
    println!("  Strategies: {strategy_names:?}");
    println!("  Restarts:   {restarts}");
    println!();

    // ── Results Table ──────────────────────────────────────────
    println!(
        "  {:<18} {:>10} {:>12} {:>8} {:>12} {:>7} {:>10}",
        "Strategy", "Budget", "Cost", "Better", "Memory", "Rounds", "Time",
    );
    println!("  {}", "-".repeat(84));

    let mut results: Vec<BenchResult> = Vec::new();

    for &budget in &budgets {
        for &strategy_name in &strategy_names {
            match run_single(&base, budget, strategy_name, restarts).await {
                Ok(r) => {
                    println!(
                        "  {:<18} {:>10} {:>12.6} {:>7.1}% {:>12} {:>7} {:>8.2}ms",
                        r.strategy,
                        r.budget_label,
                        r.final_cost,
                        r.improvement_pct,
                        format_bytes(r.memory_bytes),
                        r.rounds,
                        r.total_ms,
                    );
                    results.push(r);
                }
                Err(e) => {
                    println!(
                        "  {:<18} {:>10}     FAILED: {e}",
                        strategy_name,
                        format!("{budget}"),
                    );
                }
            }
        }
    }

    println!();

    // ── Summary ────────────────────────────────────────────────
    let Some(cheapest) = results.iter().min_by(|a, b| {
        a.final_cost
            .partial_cmp(&b.final_cost)
            .unwrap_or(Ordering::Equal)
    }) else {
        println!("  No successful benchmark runs.");
        return Ok(());
    };
    let fastest = results.iter().min_by(|a, b| {
        a.total_ms
            .partial_cmp(&b.total_ms)
            .unwrap_or(Ordering::Equal)
    });

    println!("  Summary:");
    println!(
        "   Cheapest plan:  {} @ {} (cost {:.6})",
        cheapest.strategy, cheapest.budget_label, cheapest.final_cost,
    );
    if let Some(fastest) = fastest {
        println!(
            "   Fastest run:    {} @ {} ({:.2}ms)",
            fastest.strategy, fastest.budget_label, fastest.total_ms,
        );
    }
    println!();

    Ok(())
}

#[derive(Debug)]
struct BenchResult {
    strategy: String,
    budget_label: String,
    final_cost: f64,
    improvement_pct: f64,
    memory_bytes: u64,
    rounds: usize,
    total_ms: f64,
}

/// Runs a single benchmark configuration.
async fn run_single(
    base: &DesignerConfig,
    budget: MemoryBudget,
    strategy_name: &str,
    restarts: u32,
) -> anyhow::Result<BenchResult> {
    let mut config = base.clone();
    config.memory_budget = format!("{}", budget.as_bytes());
    if budget.is_unbounded() {
        config.memory_budget = "unbounded".into();
    }
    config.strategy = strategy_name.to_string();
    // Every run starts cold and leaves no files behind.
    config.checkpoint_path = None;
    config.hints.checkpoint_path = None;
    config.output_path = None;
    config.hints.limit_restarts = Some(restarts);

    let output = Designer::new(config).load_inputs()?.run().await?;
    let m = &output.metrics;

    Ok(BenchResult {
        strategy: strategy_name.to_string(),
        budget_label: format!("{budget}"),
        final_cost: m.final_cost,
        improvement_pct: m.improvement_pct(),
        memory_bytes: m.memory_bytes,
        rounds: m.rounds.len(),
        total_ms: m.total_duration.as_secs_f64() * 1000.0,
    })
}
