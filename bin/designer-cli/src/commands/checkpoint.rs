// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `lns-designer checkpoint` command: summarise a saved search state.

use partition_planner::{now_ms, SearchState};
use std::path::PathBuf;

pub fn execute(path: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║          lns-designer · Checkpoint Summary           ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let state = SearchState::load(&path)?;

    println!("  File:     {}", path.display());
    println!("  Restarts: {}", state.restart_counter);
    println!(
        "  Last relaxation: {} tables{}",
        state.last_relax_size,
        if state.last_exhausted_search {
            " (exhausted)"
        } else {
            ""
        },
    );
    if let Some(weight) = state.entropy_weight {
        println!("  Entropy weight: {weight:.4}");
    }
    if let (Some(start), Some(last)) = (state.start_time, state.last_checkpoint) {
        println!(
            "  Searched for {:.1}s, last saved {:.1}s ago",
            last.saturating_sub(start) as f64 / 1000.0,
            now_ms().saturating_sub(last) as f64 / 1000.0,
        );
    }
    println!();

    // ── Costs ──────────────────────────────────────────────────
    println!("  {:<10} {:>14} {:>10}", "", "Cost", "Memory");
    println!(
        "  {:<10} {:>14.6} {:>9.1}%",
        "initial",
        state.initial_cost,
        state.initial_memory * 100.0,
    );
    println!(
        "  {:<10} {:>14.6} {:>9.1}%",
        "best",
        state.best_cost,
        state.best_memory * 100.0,
    );
    println!();

    // ── Best Plan ──────────────────────────────────────────────
    match (&state.best_solution, &state.initial_solution) {
        (Some(best), initial) => {
            println!("  Best plan: {}", best.summary());
            if let Some(initial) = initial {
                let changed = best.diff(initial);
                if changed.is_empty() {
                    println!("   Same as the initial plan.");
                } else {
                    println!("   Changed from the initial plan:");
                    for name in changed {
                        let now = best
                            .table(&name)
                            .map(|a| a.to_string())
                            .or_else(|| best.procedure(&name).map(|p| p.to_string()))
                            .unwrap_or_default();
                        println!("    {name:<24} → {now}");
                    }
                }
            }
        }
        (None, _) => println!("  No best plan recorded yet."),
    }
    println!();

    Ok(())
}
