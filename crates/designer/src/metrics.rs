// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Design run metrics.
//!
//! [`DesignMetrics`] collects per-round and aggregate search data: how the
//! best cost evolved, how much of each neighborhood was explored and where
//! the time went. These are what `benchmark` compares strategies on.

use partition_planner::RoundReport;
use std::time::Duration;

/// Metrics for a single relax → local-search round.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RoundMetrics {
    pub restart: u32,
    pub relax_size: usize,
    /// Cost the local search returned.
    pub cost: f64,
    /// Best cost after the round.
    pub best_cost: f64,
    pub accepted: bool,
    pub exhausted: bool,
    pub nodes: u64,
    pub back_tracks: u64,
    pub duration: Duration,
}

impl From<&RoundReport> for RoundMetrics {
    fn from(r: &RoundReport) -> Self {
        Self {
            restart: r.restart,
            relax_size: r.relax_size,
            cost: r.cost,
            best_cost: r.best_cost,
            accepted: r.accepted,
            exhausted: r.exhausted,
            nodes: r.nodes,
            back_tracks: r.back_tracks,
            duration: r.duration,
        }
    }
}

/// Aggregate metrics for a complete design run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DesignMetrics {
    /// Strategy that produced the plan.
    pub strategy: String,
    /// Total wall-clock time of the run.
    pub total_duration: Duration,
    /// Cost of the catalog's assignment before the run.
    pub baseline_cost: f64,
    /// Cost of the returned plan.
    pub final_cost: f64,
    /// Per-partition bytes of the returned plan.
    pub memory_bytes: u64,
    /// Per-partition budget; 0 when unbounded.
    pub memory_budget_bytes: u64,
    pub rounds: Vec<RoundMetrics>,
}

impl DesignMetrics {
    /// Creates an empty metrics container.
    pub fn new(strategy: impl Into<String>, baseline_cost: f64) -> Self {
        Self {
            strategy: strategy.into(),
            total_duration: Duration::ZERO,
            baseline_cost,
            final_cost: baseline_cost,
            memory_bytes: 0,
            memory_budget_bytes: 0,
            rounds: Vec::new(),
        }
    }

    /// Records the strategy's round reports.
    pub fn record_rounds(&mut self, reports: &[RoundReport]) {
        self.rounds.extend(reports.iter().map(RoundMetrics::from));
    }

    /// Finalises metrics with the outcome of the run.
    pub fn finalise(&mut self, total: Duration, final_cost: f64, memory_bytes: u64, budget: u64) {
        self.total_duration = total;
        self.final_cost = final_cost;
        self.memory_bytes = memory_bytes;
        self.memory_budget_bytes = budget;
    }

    pub fn accepted_rounds(&self) -> usize {
        self.rounds.iter().filter(|r| r.accepted).count()
    }

    /// Total branch-and-bound nodes visited across rounds.
    pub fn total_nodes(&self) -> u64 {
        self.rounds.iter().map(|r| r.nodes).sum()
    }

    /// Relative cost reduction against the baseline, in percent.
    pub fn improvement_pct(&self) -> f64 {
        if self.baseline_cost <= 0.0 {
            return 0.0;
        }
        (self.baseline_cost - self.final_cost) / self.baseline_cost * 100.0
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let memory = if self.memory_budget_bytes == 0 {
            format!("{} bytes/partition", self.memory_bytes)
        } else {
            format!(
                "{} bytes/partition ({:.0}% of budget)",
                self.memory_bytes,
                self.memory_bytes as f64 / self.memory_budget_bytes as f64 * 100.0
            )
        };
        format!(
            "Design ({}): {:.2}ms total, cost {:.6} → {:.6} ({:.1}% better), \
             {} rounds ({} accepted, {} nodes), {memory}",
            self.strategy,
            self.total_duration.as_secs_f64() * 1000.0,
            self.baseline_cost,
            self.final_cost,
            self.improvement_pct(),
            self.rounds.len(),
            self.accepted_rounds(),
            self.total_nodes(),
        )
    }
}
