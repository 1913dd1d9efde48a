// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Designer configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! catalog_path = "./tpcc/catalog.json"
//! workload_path = "./tpcc/workload.json"
//! correlations_path = "./tpcc/correlations.json"
//! checkpoint_path = "./tpcc/lns.checkpoint"
//! memory_budget = "512M"
//! strategy = "lns"
//!
//! [hints]
//! limit_total_time = 600
//! limit_back_tracks = 5000
//! relaxation_factor_max = 0.5
//! ```
//!
//! `memory_budget` and `checkpoint_path` override the matching `[hints]`
//! entries when set.

use crate::DesignerError;
use cost_model::{CostModel, SingleSitedCostModel};
use memory_estimator::MemoryBudget;
use partition_planner::{DesignerHints, PartitionStrategy};
use std::path::{Path, PathBuf};

/// Configuration for one design run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DesignerConfig {
    /// Path to the JSON catalog manifest.
    pub catalog_path: PathBuf,
    /// Path to the JSON workload trace.
    pub workload_path: PathBuf,
    /// Path to the JSON parameter correlations.
    #[serde(default)]
    pub correlations_path: Option<PathBuf>,
    /// Where the LNS search checkpoints its state.
    #[serde(default)]
    pub checkpoint_path: Option<PathBuf>,
    /// Where the final plan is written as JSON.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Per-partition memory budget (human-readable, e.g., `"512M"`).
    #[serde(default = "default_budget")]
    pub memory_budget: String,
    /// Strategy name: `"lns"`, `"most-popular"`, `"branch-and-bound"`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Search tunables.
    #[serde(default)]
    pub hints: DesignerHints,
}

fn default_budget() -> String {
    "unbounded".to_string()
}

fn default_strategy() -> String {
    "lns".to_string()
}

impl DesignerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DesignerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DesignerError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, DesignerError> {
        toml::from_str(toml_str)
            .map_err(|e| DesignerError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, DesignerError> {
        toml::to_string_pretty(self)
            .map_err(|e| DesignerError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Parses the memory budget string into a [`MemoryBudget`].
    pub fn parse_budget(&self) -> Result<MemoryBudget, DesignerError> {
        Ok(MemoryBudget::parse(&self.memory_budget)?)
    }

    /// The hints the strategy runs with: `[hints]` plus the top-level
    /// budget and checkpoint path.
    pub fn resolve_hints(&self) -> Result<DesignerHints, DesignerError> {
        let mut hints = self.hints.clone();
        let budget = self.parse_budget()?;
        if !budget.is_unbounded() {
            hints.max_memory_per_partition = budget.as_bytes();
        }
        if self.checkpoint_path.is_some() {
            hints.checkpoint_path = self.checkpoint_path.clone();
        }
        hints.validate()?;
        Ok(hints)
    }

    /// Creates the partition strategy specified by this config.
    pub fn create_strategy(&self) -> Result<Box<dyn PartitionStrategy>, DesignerError> {
        Ok(partition_planner::create_strategy(
            self.strategy.to_lowercase().as_str(),
        )?)
    }

    /// Creates the reference cost model weighted and cached per `hints`.
    pub fn create_cost_model(
        &self,
        hints: &DesignerHints,
    ) -> Result<Box<dyn CostModel>, DesignerError> {
        let model = SingleSitedCostModel::new()
            .with_weights(
                hints.weight_costmodel_execution,
                hints.weight_costmodel_entropy,
            )?
            .with_caching(hints.enable_costmodel_caching);
        Ok(Box::new(model))
    }
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("./catalog.json"),
            workload_path: PathBuf::from("./workload.json"),
            correlations_path: None,
            checkpoint_path: None,
            output_path: None,
            memory_budget: default_budget(),
            strategy: default_strategy(),
            hints: DesignerHints::default(),
        }
    }
}
