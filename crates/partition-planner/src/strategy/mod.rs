// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`PartitionStrategy`] trait and strategy implementations.

pub mod branch_and_bound;
pub mod greedy;
pub mod lns;

use crate::{DesignContext, DesignerHints, PartitionPlan, PlannerError};
use std::time::Duration;

/// Trait for partitioning strategies.
///
/// A strategy reads and mutates the catalog held by the [`DesignContext`]
/// and returns the plan it settled on. On success the catalog is left
/// holding that plan. Hints are passed mutably because a strategy may
/// rewrite the tunables it auto-adjusts.
pub trait PartitionStrategy: Send {
    /// Human-readable name of this strategy.
    fn name(&self) -> &str;

    /// Searches for a plan.
    fn generate(
        &mut self,
        ctx: &mut DesignContext,
        hints: &mut DesignerHints,
    ) -> Result<PartitionPlan, PlannerError>;

    /// Per-round reports of the last run, for strategies that iterate.
    fn rounds(&self) -> &[RoundReport] {
        &[]
    }
}

/// Outcome of one relax → local-search round.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RoundReport {
    pub restart: u32,
    pub relax_size: usize,
    pub relaxed_tables: Vec<String>,
    /// Exact cost of the plan the local search returned.
    pub cost: f64,
    /// Best cost after the round.
    pub best_cost: f64,
    pub accepted: bool,
    pub exhausted: bool,
    pub nodes: u64,
    pub back_tracks: u64,
    pub duration: Duration,
}
