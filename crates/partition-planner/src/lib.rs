// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # partition-planner
//!
//! Searches for a partitioning plan (one attribute per table, one routing
//! parameter per procedure) that minimizes the cost model's estimate for a
//! workload while fitting a per-partition memory budget.
//!
//! # Strategies
//!
//! | Strategy | Search | Terminates on |
//! |---|---|---|
//! | [`MostPopular`] | One greedy pass | Always |
//! | [`BranchAndBound`] | Whole catalog, depth-first | Exhaustion or limits |
//! | [`LnsPartitioner`] | Random neighborhoods + branch-and-bound | Deadline, restart limit or exhaustion |
//!
//! # Trait-Based Extensibility
//!
//! All strategies implement [`PartitionStrategy`] and operate on a
//! [`DesignContext`], which owns the catalog being rewritten:
//!
//! ```ignore
//! struct MyStrategy;
//! impl PartitionStrategy for MyStrategy {
//!     fn name(&self) -> &str { "custom" }
//!     fn generate(&mut self, ctx: &mut DesignContext, hints: &mut DesignerHints)
//!         -> Result<PartitionPlan, PlannerError> { /* ... */ }
//! }
//! ```
//!
//! # Example
//! ```no_run
//! use catalog_model::CatalogLoader;
//! use cost_model::{SingleSitedCostModel, Workload};
//! use memory_estimator::TableSizeEstimator;
//! use partition_planner::{DesignContext, DesignerHints, LnsPartitioner, PartitionStrategy};
//! use std::path::Path;
//!
//! let catalog = CatalogLoader::load(Path::new("./catalog.json")).unwrap();
//! let workload = Workload::from_file(Path::new("./workload.json")).unwrap();
//! let mut ctx = DesignContext::new(
//!     catalog,
//!     workload,
//!     Box::new(SingleSitedCostModel::new()),
//!     Box::new(TableSizeEstimator::new()),
//! );
//! let mut hints = DesignerHints { limit_total_time: Some(60), ..DesignerHints::default() };
//! let plan = LnsPartitioner::new().generate(&mut ctx, &mut hints).unwrap();
//! println!("{}", plan.summary());
//! ```

mod checkpoint;
mod context;
mod error;
mod hints;
mod index;
pub mod mutators;
mod plan;
pub mod ranking;
pub mod strategy;

#[cfg(test)]
mod test_support;

pub use checkpoint::SearchState;
pub use context::DesignContext;
pub use error::PlannerError;
pub use hints::{now_ms, DesignerHints};
pub use index::SearchIndex;
pub use plan::PartitionPlan;
pub use strategy::branch_and_bound::{
    BoundedLocalSearch, BranchAndBound, LocalSearchOutcome, LocalSearchRequest, SearchLimits,
    UpperBounds,
};
pub use strategy::greedy::{seed_plan, MostPopular};
pub use strategy::lns::{LnsPartitioner, RelaxationPolicy};
pub use strategy::{PartitionStrategy, RoundReport};

/// Names accepted by [`create_strategy`].
pub const STRATEGY_NAMES: &[&str] = &["lns", "most-popular", "branch-and-bound"];

/// Instantiates a strategy by name.
pub fn create_strategy(name: &str) -> Result<Box<dyn PartitionStrategy>, PlannerError> {
    match name {
        "lns" => Ok(Box::new(LnsPartitioner::new())),
        "most-popular" => Ok(Box::new(MostPopular::new())),
        "branch-and-bound" => Ok(Box::new(BranchAndBound::new())),
        other => Err(PlannerError::Config(format!(
            "unknown strategy '{other}', expected one of {STRATEGY_NAMES:?}"
        ))),
    }
}
