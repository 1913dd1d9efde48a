// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The design context: everything a strategy reads or mutates.
//!
//! The catalog is the single mutable resource of a design run. It lives
//! here, next to the collaborators that price it, and the context is passed
//! by `&mut` into every component call, so only one component can write to
//! the catalog at any moment.

use crate::PlannerError;
use catalog_model::catalog::Validated;
use catalog_model::{Catalog, ParameterCorrelations};
use cost_model::{CostModel, Workload};
use memory_estimator::MemoryEstimator;
use std::path::PathBuf;

/// Catalog, workload and the collaborators that price plans.
pub struct DesignContext {
    pub catalog: Catalog<Validated>,
    pub workload: Workload,
    pub cost_model: Box<dyn CostModel>,
    pub memory_estimator: Box<dyn MemoryEstimator>,
    pub correlations: ParameterCorrelations,
    /// Where correlations are reloaded from at search start.
    pub correlations_path: Option<PathBuf>,
}

impl DesignContext {
    /// Creates a context without correlation statistics.
    pub fn new(
        catalog: Catalog<Validated>,
        workload: Workload,
        cost_model: Box<dyn CostModel>,
        memory_estimator: Box<dyn MemoryEstimator>,
    ) -> Self {
        Self {
            catalog,
            workload,
            cost_model,
            memory_estimator,
            correlations: ParameterCorrelations::new(),
            correlations_path: None,
        }
    }

    pub fn with_correlations(mut self, correlations: ParameterCorrelations) -> Self {
        self.correlations = correlations;
        self
    }

    pub fn with_correlations_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.correlations_path = Some(path.into());
        self
    }

    pub fn num_partitions(&self) -> u32 {
        self.catalog.num_partitions
    }

    /// Reloads correlation statistics bound to the live catalog.
    ///
    /// A no-op when no correlations file is configured.
    pub fn reload_correlations(&mut self) -> Result<(), PlannerError> {
        if let Some(path) = &self.correlations_path {
            self.correlations = ParameterCorrelations::load(path, &self.catalog)?;
        }
        Ok(())
    }

    /// Cost of the catalog's current assignment.
    pub fn estimate_cost(&mut self) -> Result<f64, PlannerError> {
        Ok(self.cost_model.estimate_cost(&self.catalog, &self.workload)?)
    }

    /// Per-partition bytes of the catalog's current assignment.
    pub fn estimate_memory(&mut self) -> Result<u64, PlannerError> {
        let partitions = self.catalog.num_partitions;
        Ok(self.memory_estimator.estimate(&self.catalog, partitions)?)
    }

    /// Per-partition bytes of the named tables only.
    pub fn estimate_memory_of(&mut self, tables: &[String]) -> Result<u64, PlannerError> {
        let partitions = self.catalog.num_partitions;
        Ok(self
            .memory_estimator
            .estimate_tables(&self.catalog, partitions, tables)?)
    }
}

impl std::fmt::Debug for DesignContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignContext")
            .field("catalog", &self.catalog.name)
            .field("transactions", &self.workload.len())
            .field("cost_model", &self.cost_model.name())
            .field("memory_estimator", &self.memory_estimator.name())
            .field("correlations", &self.correlations.len())
            .finish()
    }
}
