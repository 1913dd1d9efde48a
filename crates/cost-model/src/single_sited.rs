// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference cost model: single-sited execution plus partition skew.
//!
//! Every traced transaction is replayed against the catalog's current
//! assignment:
//!
//! - The procedure's partitioning parameter picks the **base partition**.
//!   A `Null` parameter (or a trace missing the value) means the invocation
//!   cannot be routed and runs distributed.
//! - Each query touches the partition its predicate values hash to. A query
//!   that does not bind every partitioning column, or that writes a
//!   replicated table, touches every partition. Reads of replicated tables
//!   are served at the base partition.
//! - A transaction is *single-sited* when it has a base partition and
//!   touches nothing else.
//!
//! ```text
//! cost = w_exec × Σ exec / (txns × penalty)  +  w_entropy × (1 − H / ln P)
//!        exec = 1 (single-sited) | penalty (distributed)
//!        H    = entropy of partition access counts
//! ```
//!
//! Results are cached per procedure. A procedure's entry depends on its own
//! parameter and on the attributes of the tables its traces query, which is
//! exactly what the invalidation methods drop.

use crate::{CostModel, CostModelError, TransactionTrace, Workload};
use catalog_model::catalog::Validated;
use catalog_model::{Catalog, PartitionAttribute, ProcedureDef};
use std::collections::{BTreeSet, HashMap};

/// Execution cost of a distributed transaction relative to a single-sited one.
pub const DEFAULT_MULTI_PARTITION_PENALTY: f64 = 10.0;

/// Cumulative cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostModelStats {
    pub estimates: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[derive(Debug, Clone, Default)]
struct ProcedureCost {
    transactions: u64,
    exec_cost: f64,
    partition_hits: Vec<u64>,
}

/// The default [`CostModel`].
#[derive(Debug, Clone)]
pub struct SingleSitedCostModel {
    execution_weight: f64,
    entropy_weight: f64,
    penalty: f64,
    caching: bool,
    num_partitions: u32,
    cache: HashMap<String, ProcedureCost>,
    /// table → procedures whose traces query it; built on first estimate.
    table_procedures: Option<HashMap<String, BTreeSet<String>>>,
    last_hits: Vec<u64>,
    stats: CostModelStats,
}

impl SingleSitedCostModel {
    /// Creates a model with unit weights and caching enabled.
    pub fn new() -> Self {
        Self {
            execution_weight: 1.0,
            entropy_weight: 1.0,
            penalty: DEFAULT_MULTI_PARTITION_PENALTY,
            caching: true,
            num_partitions: 0,
            cache: HashMap::new(),
            table_procedures: None,
            last_hits: Vec::new(),
            stats: CostModelStats::default(),
        }
    }

    /// Sets the execution and entropy weights.
    pub fn with_weights(mut self, execution: f64, entropy: f64) -> Result<Self, CostModelError> {
        for (label, w) in [("execution", execution), ("entropy", entropy)] {
            if !w.is_finite() || w < 0.0 {
                return Err(CostModelError::InvalidWeights(format!(
                    "{label} weight must be finite and non-negative, got {w}"
                )));
            }
        }
        self.execution_weight = execution;
        self.entropy_weight = entropy;
        Ok(self)
    }

    /// Enables or disables the per-procedure cache.
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching = enabled;
        self
    }

    /// Sets the distributed-transaction penalty (at least 1).
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty.max(1.0);
        self
    }

    pub fn execution_weight(&self) -> f64 {
        self.execution_weight
    }

    pub fn stats(&self) -> CostModelStats {
        self.stats
    }

    fn ensure_table_index(&mut self, workload: &Workload) {
        if self.table_procedures.is_some() {
            return;
        }
        let mut index: HashMap<String, BTreeSet<String>> = HashMap::new();
        for txn in &workload.transactions {
            for q in &txn.queries {
                index
                    .entry(q.table.clone())
                    .or_default()
                    .insert(txn.procedure.clone());
            }
        }
        self.table_procedures = Some(index);
    }

    fn cost_procedure(
        &self,
        catalog: &Catalog<Validated>,
        proc: &ProcedureDef,
        workload: &Workload,
    ) -> Result<ProcedureCost, CostModelError> {
        let partitions = catalog.num_partitions;
        let mut out = ProcedureCost {
            partition_hits: vec![0; partitions as usize],
            ..ProcedureCost::default()
        };
        for txn in workload.for_procedure(&proc.name) {
            let base = base_partition(proc, txn, partitions);
            let mut touched = BTreeSet::new();
            let mut everywhere = false;
            for q in &txn.queries {
                let table = catalog
                    .table(&q.table)
                    .ok_or_else(|| CostModelError::UnknownTable(q.table.clone()))?;
                match &table.partition {
                    PartitionAttribute::Replicated => everywhere |= q.is_write,
                    attr => {
                        let values: Option<Vec<i64>> = attr
                            .columns()
                            .iter()
                            .map(|c| q.predicates.get(*c).copied())
                            .collect();
                        match values {
                            Some(v) => {
                                touched.insert(partition_of(&v, partitions));
                            }
                            None => everywhere = true,
                        }
                    }
                }
            }
            if everywhere {
                touched.extend(0..partitions);
            }
            let single_sited = match base {
                Some(b) => touched.iter().all(|&p| p == b),
                None => false,
            };
            if let Some(b) = base {
                touched.insert(b);
            }

            out.transactions += 1;
            out.exec_cost += if single_sited { 1.0 } else { self.penalty };
            for p in touched {
                out.partition_hits[p as usize] += 1;
            }
        }
        Ok(out)
    }
}

impl Default for SingleSitedCostModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CostModel for SingleSitedCostModel {
    fn name(&self) -> &str {
        "single-sited"
    }

    fn estimate_cost(
        &mut self,
        catalog: &Catalog<Validated>,
        workload: &Workload,
    ) -> Result<f64, CostModelError> {
        let partitions = catalog.num_partitions;
        if partitions != self.num_partitions {
            self.cache.clear();
            self.num_partitions = partitions;
        }
        self.ensure_table_index(workload);
        self.stats.estimates += 1;

        let procedures: BTreeSet<&str> = workload
            .transactions
            .iter()
            .map(|t| t.procedure.as_str())
            .collect();

        let mut transactions = 0u64;
        let mut exec_cost = 0.0;
        let mut hits = vec![0u64; partitions as usize];
        for name in procedures {
            let cached = if self.caching {
                self.cache.get(name).cloned()
            } else {
                None
            };
            let entry = match cached {
                Some(entry) => {
                    self.stats.cache_hits += 1;
                    entry
                }
                None => {
                    self.stats.cache_misses += 1;
                    let proc = catalog
                        .procedure(name)
                        .ok_or_else(|| CostModelError::UnknownProcedure(name.to_string()))?;
                    let entry = self.cost_procedure(catalog, proc, workload)?;
                    if self.caching {
                        self.cache.insert(name.to_string(), entry.clone());
                    }
                    entry
                }
            };
            transactions += entry.transactions;
            exec_cost += entry.exec_cost;
            for (total, h) in hits.iter_mut().zip(&entry.partition_hits) {
                *total += h;
            }
        }

        let exec_term = if transactions == 0 {
            0.0
        } else {
            exec_cost / (transactions as f64 * self.penalty)
        };
        let skew = skew(&hits);
        self.last_hits = hits;

        let cost = self.execution_weight * exec_term + self.entropy_weight * skew;
        tracing::trace!("cost {cost:.6} (exec {exec_term:.6}, skew {skew:.6})");
        Ok(cost)
    }

    fn invalidate_table(&mut self, table: &str) {
        if let Some(procs) = self.table_procedures.as_ref().and_then(|i| i.get(table)) {
            for p in procs {
                self.cache.remove(p);
            }
        }
    }

    fn invalidate_procedure(&mut self, procedure: &str) {
        self.cache.remove(procedure);
    }

    fn clear(&mut self, full: bool) {
        self.cache.clear();
        if full {
            self.last_hits.clear();
            self.table_procedures = None;
        }
    }

    fn caching_enabled(&self) -> bool {
        self.caching
    }

    fn entropy_weight(&self) -> f64 {
        self.entropy_weight
    }

    fn set_entropy_weight(&mut self, weight: f64) {
        self.entropy_weight = weight;
    }

    fn untouched_partitions(&self, num_partitions: u32) -> BTreeSet<u32> {
        (0..num_partitions)
            .filter(|&p| self.last_hits.get(p as usize).copied().unwrap_or(0) == 0)
            .collect()
    }
}

fn base_partition(proc: &ProcedureDef, txn: &TransactionTrace, partitions: u32) -> Option<u32> {
    let indices = proc.partition_parameter.indices();
    if indices.is_empty() {
        return None;
    }
    let values: Option<Vec<i64>> = indices
        .iter()
        .map(|&i| txn.params.get(i).and_then(|v| v.as_scalar()))
        .collect();
    values.map(|v| partition_of(&v, partitions))
}

/// Partition a (possibly composite) key hashes to.
pub fn partition_of(values: &[i64], partitions: u32) -> u32 {
    let h = values
        .iter()
        .fold(0i64, |h, &v| h.wrapping_mul(31).wrapping_add(v));
    h.rem_euclid(i64::from(partitions.max(1))) as u32
}

/// `1 − H / ln P` over access counts; 0 for a single partition or no hits.
fn skew(hits: &[u64]) -> f64 {
    let total: u64 = hits.iter().sum();
    if total == 0 || hits.len() < 2 {
        return 0.0;
    }
    let entropy: f64 = hits
        .iter()
        .filter(|&&h| h > 0)
        .map(|&h| {
            let p = h as f64 / total as f64;
            -p * p.ln()
        })
        .sum();
    1.0 - entropy / (hits.len() as f64).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_model::{ColumnRef, PartitionParameter, TableDef};

    fn catalog() -> Catalog<Validated> {
        let mut c = Catalog::new(
            "cost",
            2,
            vec![
                TableDef::new("ACCT", &["A_ID", "A_BRANCH"], None),
                TableDef::new("BRANCH", &["B_ID"], None),
            ],
            vec![ProcedureDef::new(
                "Deposit",
                &["a_id", "branch"],
                vec![
                    ColumnRef::new("ACCT", "A_ID"),
                    ColumnRef::new("BRANCH", "B_ID"),
                ],
            )],
        )
        .validate()
        .unwrap();
        c.set_partition_parameter("Deposit", PartitionParameter::Parameter(0))
            .unwrap();
        c
    }

    fn workload() -> Workload {
        Workload::from_json(
            r#"{ "transactions": [
                { "procedure": "Deposit", "params": [0, 5],
                  "queries": [{ "table": "ACCT", "predicates": { "A_ID": 0 } },
                              { "table": "BRANCH", "predicates": { "B_ID": 5 } }] },
                { "procedure": "Deposit", "params": [1, 5],
                  "queries": [{ "table": "ACCT", "predicates": { "A_ID": 1 } },
                              { "table": "BRANCH", "predicates": { "B_ID": 5 } }] }
            ] }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_replicating_lookup_table_makes_single_sited() {
        let w = workload();
        let mut c = catalog();
        let mut model = SingleSitedCostModel::new().with_weights(1.0, 0.0).unwrap();

        // BRANCH on B_ID: txn with a_id=0 lands on partition 0 but reads branch 5 on partition 1.
        let distributed = model.estimate_cost(&c, &w).unwrap();

        c.set_partition_attribute("BRANCH", PartitionAttribute::Replicated)
            .unwrap();
        model.invalidate_table("BRANCH");
        let local = model.estimate_cost(&c, &w).unwrap();

        assert!(local < distributed);
        assert!((local - 1.0 / DEFAULT_MULTI_PARTITION_PENALTY).abs() < 1e-12);
    }

    #[test]
    fn test_null_parameter_is_distributed() {
        let w = workload();
        let mut c = catalog();
        c.set_partition_attribute("BRANCH", PartitionAttribute::Replicated)
            .unwrap();
        c.set_partition_parameter("Deposit", PartitionParameter::Null)
            .unwrap();
        let mut model = SingleSitedCostModel::new().with_weights(1.0, 0.0).unwrap();
        assert!((model.estimate_cost(&c, &w).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cache_invalidation() {
        let w = workload();
        let mut c = catalog();
        let mut model = SingleSitedCostModel::new();
        let first = model.estimate_cost(&c, &w).unwrap();
        let again = model.estimate_cost(&c, &w).unwrap();
        assert_eq!(first, again);
        assert_eq!(model.stats().cache_hits, 1);

        // A stale cache keeps the old answer until the table is invalidated.
        c.set_partition_attribute("BRANCH", PartitionAttribute::Replicated)
            .unwrap();
        assert_eq!(model.estimate_cost(&c, &w).unwrap(), first);
        model.invalidate_table("BRANCH");
        assert_ne!(model.estimate_cost(&c, &w).unwrap(), first);
    }

    #[test]
    fn test_caching_disabled_never_stale() {
        let w = workload();
        let mut c = catalog();
        let mut model = SingleSitedCostModel::new().with_caching(false);
        let first = model.estimate_cost(&c, &w).unwrap();
        c.set_partition_attribute("BRANCH", PartitionAttribute::Replicated)
            .unwrap();
        assert_ne!(model.estimate_cost(&c, &w).unwrap(), first);
        assert_eq!(model.stats().cache_hits, 0);
    }

    #[test]
    fn test_untouched_partitions() {
        let mut c = Catalog::new("u", 4, vec![TableDef::new("T", &["K"], None)], vec![
            ProcedureDef::new("P", &["k"], vec![ColumnRef::new("T", "K")]),
        ])
        .validate()
        .unwrap();
        c.set_partition_parameter("P", PartitionParameter::Parameter(0))
            .unwrap();
        let w = Workload::from_json(
            r#"{ "transactions": [
                { "procedure": "P", "params": [0], "queries": [{ "table": "T", "predicates": { "K": 0 } }] },
                { "procedure": "P", "params": [1], "queries": [{ "table": "T", "predicates": { "K": 1 } }] }
            ] }"#,
        )
        .unwrap();
        let mut model = SingleSitedCostModel::new();
        assert_eq!(model.untouched_partitions(4).len(), 4);
        model.estimate_cost(&c, &w).unwrap();
        assert_eq!(
            model.untouched_partitions(4).into_iter().collect::<Vec<_>>(),
            vec![2, 3]
        );
    }

    #[test]
    fn test_unknown_procedure() {
        let w = Workload::from_json(r#"{ "transactions": [{ "procedure": "Nope" }] }"#).unwrap();
        let mut model = SingleSitedCostModel::new();
        assert!(matches!(
            model.estimate_cost(&catalog(), &w),
            Err(CostModelError::UnknownProcedure(_))
        ));
    }

    #[test]
    fn test_invalid_weights() {
        assert!(SingleSitedCostModel::new().with_weights(-1.0, 1.0).is_err());
        assert!(SingleSitedCostModel::new().with_weights(1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_skew_and_partition_of() {
        assert_eq!(skew(&[5, 5]), 0.0);
        assert!((skew(&[10, 0]) - 1.0).abs() < 1e-12);
        assert_eq!(skew(&[0, 0]), 0.0);
        assert_eq!(partition_of(&[-1], 4), 3);
        assert_eq!(partition_of(&[7], 4), 3);
    }
}
