// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The cost model interface consumed by the designer.
//!
//! Implementations are stateful: they may cache per-procedure or per-table
//! partial results between calls. Callers never touch that cache directly;
//! they only announce which assignments changed via the invalidation
//! methods, or drop everything with [`CostModel::clear`].

use crate::{CostModelError, Workload};
use catalog_model::catalog::Validated;
use catalog_model::Catalog;
use std::collections::BTreeSet;

/// A cache-aware estimator of workload cost under the catalog's current
/// assignment. Lower is better.
pub trait CostModel: Send {
    /// Human-readable model name.
    fn name(&self) -> &str;

    /// Estimated cost of running `workload` under `catalog`'s assignment.
    fn estimate_cost(
        &mut self,
        catalog: &Catalog<Validated>,
        workload: &Workload,
    ) -> Result<f64, CostModelError>;

    /// Drops cached results that depend on `table`'s attribute.
    fn invalidate_table(&mut self, table: &str);

    /// Drops cached results that depend on `procedure`'s parameter.
    fn invalidate_procedure(&mut self, procedure: &str);

    /// Drops cached results. `full` also discards derived state kept across
    /// estimates, such as the last partition access profile.
    fn clear(&mut self, full: bool);

    /// Returns `true` if cached partial results are reused between estimates.
    fn caching_enabled(&self) -> bool;

    /// Current weight of the partition-skew term.
    fn entropy_weight(&self) -> f64;

    /// Replaces the weight of the partition-skew term.
    fn set_entropy_weight(&mut self, weight: f64);

    /// Partitions that no transaction touched in the most recent estimate.
    fn untouched_partitions(&self, num_partitions: u32) -> BTreeSet<u32>;
}
