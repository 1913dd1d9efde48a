// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `lns-designer inspect` command: display catalog structure and memory bounds.
//!
//! Prints every table with its per-partition footprint partitioned and
//! replicated, every procedure with its current routing, and (given a
//! workload) how often each procedure and column is traced.

use super::{format_bytes, truncate};
use catalog_model::CatalogLoader;
use cost_model::Workload;
use std::path::PathBuf;

pub fn execute(catalog: PathBuf, workload: Option<PathBuf>) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           lns-designer · Catalog Inspector           ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let catalog = CatalogLoader::load(&catalog).map_err(|e| {
        anyhow::anyhow!("failed to load catalog from '{}': {e}", catalog.display())
    })?;
    let partitions = u64::from(catalog.num_partitions.max(1));

    // ── Summary ────────────────────────────────────────────────
    println!("  {}", catalog.summary());
    println!();

    // ── Tables ─────────────────────────────────────────────────
    println!(
        "  {:<24} {:>4} {:>12} {:>12}  {}",
        "Table", "Cols", "Partitioned", "Replicated", "Current",
    );
    println!("  {}", "-".repeat(78));

    let (mut min_bytes, mut max_bytes) = (0u64, 0u64);
    let mut missing_stats = Vec::new();
    for table in catalog.tables() {
        let (partitioned, replicated) = match table.stats {
            Some(stats) => {
                let partitioned = stats.tuple_size_total.div_ceil(partitions);
                min_bytes += partitioned;
                max_bytes += stats.tuple_size_total;
                (format_bytes(partitioned), format_bytes(stats.tuple_size_total))
            }
            None => {
                missing_stats.push(table.name.as_str());
                ("-".to_string(), "-".to_string())
            }
        };
        println!(
            "  {:<24} {:>4} {:>12} {:>12}  {}",
            truncate(&table.name, 24),
            table.columns.len(),
            partitioned,
            replicated,
            table.partition,
        );
    }
    println!();

    // ── Procedures ─────────────────────────────────────────────
    println!(
        "  {:<24} {:>6} {:>6}  {}",
        "Procedure", "Params", "Refs", "Partition parameter",
    );
    println!("  {}", "-".repeat(62));
    for proc in catalog.procedures() {
        println!(
            "  {:<24} {:>6} {:>6}  {}{}",
            truncate(&proc.name, 24),
            proc.parameters.len(),
            proc.column_refs.len(),
            proc.partition_parameter,
            if proc.system { "  [system]" } else { "" },
        );
    }
    println!();

    // ── Budget Bounds ──────────────────────────────────────────
    if missing_stats.is_empty() {
        println!("  Budget Bounds (per partition):");
        println!(
            "   Minimum (all partitioned): {}",
            format_bytes(min_bytes)
        );
        println!(
            "   Maximum (all replicated):  {}",
            format_bytes(max_bytes)
        );
    } else {
        println!(
            "  Tables without statistics (the search cannot run): {}",
            missing_stats.join(", ")
        );
    }
    println!();

    // ── Workload ───────────────────────────────────────────────
    let Some(path) = workload else {
        return Ok(());
    };
    let workload = Workload::from_file(&path)?;
    let histograms = workload.column_histograms();

    println!("  Workload: {} transactions", workload.len());
    println!("  {:<24} {:>8}  {}", "Procedure", "Traces", "Top columns");
    println!("  {}", "-".repeat(62));
    for proc in catalog.procedures().filter(|p| !p.system) {
        let traces = workload.for_procedure(&proc.name).count();
        let top = histograms
            .get(&proc.name)
            .map(|h| {
                let mut columns: Vec<_> = h.iter().collect();
                columns.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                columns
                    .iter()
                    .take(3)
                    .map(|(c, n)| format!("{c}×{n}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_else(|| "untraced".to_string());
        println!("  {:<24} {:>8}  {}", truncate(&proc.name, 24), traces, top);
    }
    println!();

    Ok(())
}
