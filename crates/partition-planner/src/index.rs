// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Read-only search index built once per design run.
//!
//! Holds the candidate universe and every cross-reference the search needs:
//!
//! ```text
//! table     → candidate attributes   (referenced columns, [pairs], Replicated)
//! table     → size (partitioned / replicated)
//! procedure → candidate parameters   (scalar params, [pairs], Null)
//! procedure → column access histogram
//! table     → referencing procedures
//! column    → referencing procedures
//! ```
//!
//! System procedures, parameterless procedures and procedures that reference
//! no column are outside the universe and are never reassigned.

use crate::{DesignerHints, PlannerError};
use catalog_model::catalog::Validated;
use catalog_model::{Catalog, ColumnRef, PartitionAttribute, PartitionParameter};
use cost_model::{ColumnHistogram, Workload};
use std::collections::{BTreeSet, HashMap};

/// Candidate sets and cross-references for one catalog/workload pair.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    tables: Vec<String>,
    table_candidates: HashMap<String, Vec<PartitionAttribute>>,
    nonreplicated_size: HashMap<String, u64>,
    replicated_size: HashMap<String, u64>,
    procedures: Vec<String>,
    parameter_candidates: HashMap<String, Vec<PartitionParameter>>,
    histograms: HashMap<String, ColumnHistogram>,
    table_procedures: HashMap<String, BTreeSet<String>>,
    column_procedures: HashMap<ColumnRef, BTreeSet<String>>,
}

impl SearchIndex {
    /// Builds the index. Every table must carry statistics.
    pub fn build(
        catalog: &Catalog<Validated>,
        workload: &Workload,
        hints: &DesignerHints,
    ) -> Result<Self, PlannerError> {
        let partitions = u64::from(catalog.num_partitions.max(1));
        let mut index = Self::default();

        for proc in catalog.procedures() {
            if !proc.is_partitionable() || proc.column_refs.is_empty() {
                continue;
            }
            let scalar: Vec<usize> = proc.scalar_parameters().map(|p| p.index).collect();
            let mut candidates: Vec<PartitionParameter> =
                scalar.iter().map(|&i| PartitionParameter::Parameter(i)).collect();
            if hints.enable_multi_partitioning {
                for (n, &a) in scalar.iter().enumerate() {
                    for &b in &scalar[n + 1..] {
                        candidates.push(PartitionParameter::MultiParameter(vec![a, b]));
                    }
                }
            }
            candidates.push(PartitionParameter::Null);

            for r in &proc.column_refs {
                index
                    .table_procedures
                    .entry(r.table.clone())
                    .or_default()
                    .insert(proc.name.clone());
                index
                    .column_procedures
                    .entry(r.clone())
                    .or_default()
                    .insert(proc.name.clone());
            }
            index.procedures.push(proc.name.clone());
            index
                .parameter_candidates
                .insert(proc.name.clone(), candidates);
        }

        for table in catalog.tables() {
            let stats = table
                .stats
                .ok_or_else(|| PlannerError::MissingStatistics(table.name.clone()))?;
            index.nonreplicated_size.insert(
                table.name.clone(),
                stats.tuple_size_total.div_ceil(partitions),
            );
            index
                .replicated_size
                .insert(table.name.clone(), stats.tuple_size_total);

            let referenced: Vec<&str> = table
                .columns
                .iter()
                .map(|c| c.name.as_str())
                .filter(|c| {
                    index
                        .column_procedures
                        .contains_key(&ColumnRef::new(&table.name, *c))
                })
                .collect();
            let mut candidates: Vec<PartitionAttribute> = referenced
                .iter()
                .map(|c| PartitionAttribute::column(*c))
                .collect();
            if hints.enable_multi_partitioning {
                for (n, a) in referenced.iter().enumerate() {
                    for b in &referenced[n + 1..] {
                        candidates.push(PartitionAttribute::MultiColumn(vec![
                            (*a).to_string(),
                            (*b).to_string(),
                        ]));
                    }
                }
            }
            candidates.push(PartitionAttribute::Replicated);

            index.tables.push(table.name.clone());
            index.table_candidates.insert(table.name.clone(), candidates);
        }

        let mut histograms = workload.column_histograms();
        index.histograms = index
            .procedures
            .iter()
            .filter_map(|p| histograms.remove(p).map(|h| (p.clone(), h)))
            .collect();

        tracing::debug!(
            "search index: {} tables, {} procedures, {} histograms",
            index.tables.len(),
            index.procedures.len(),
            index.histograms.len(),
        );
        Ok(index)
    }

    /// Tables in catalog order.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// Candidate attributes of `table`, replicated sentinel last.
    pub fn candidates(&self, table: &str) -> &[PartitionAttribute] {
        self.table_candidates
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Bytes one partition holds of `table` when it is partitioned.
    pub fn nonreplicated_size(&self, table: &str) -> u64 {
        self.nonreplicated_size.get(table).copied().unwrap_or(0)
    }

    /// Bytes one partition holds of `table` when it is replicated.
    pub fn replicated_size(&self, table: &str) -> u64 {
        self.replicated_size.get(table).copied().unwrap_or(0)
    }

    /// Procedures in the candidate universe, in catalog order.
    pub fn procedures(&self) -> &[String] {
        &self.procedures
    }

    /// Returns `true` if the search may reassign `procedure`.
    pub fn is_candidate_procedure(&self, procedure: &str) -> bool {
        self.parameter_candidates.contains_key(procedure)
    }

    /// Candidate parameters of `procedure`, null sentinel last.
    pub fn parameter_candidates(&self, procedure: &str) -> &[PartitionParameter] {
        self.parameter_candidates
            .get(procedure)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Column access histogram of `procedure`, if it was traced.
    pub fn histogram(&self, procedure: &str) -> Option<&ColumnHistogram> {
        self.histograms.get(procedure)
    }

    /// Candidate procedures referencing `table`.
    pub fn table_procedures(&self, table: &str) -> impl Iterator<Item = &String> {
        self.table_procedures.get(table).into_iter().flatten()
    }

    /// Candidate procedures referencing `table.column`.
    pub fn column_procedures(&self, table: &str, column: &str) -> impl Iterator<Item = &String> {
        self.column_procedures
            .get(&ColumnRef::new(table, column))
            .into_iter()
            .flatten()
    }

    /// Candidate procedures whose ranking may change when `table` moves
    /// from `from` to `to`.
    ///
    /// A replicated side counts as every procedure referencing the table;
    /// otherwise only procedures referencing the old or new columns.
    pub fn affected_procedures(
        &self,
        table: &str,
        from: &PartitionAttribute,
        to: &PartitionAttribute,
    ) -> BTreeSet<String> {
        if from.is_replicated() || to.is_replicated() {
            return self.table_procedures(table).cloned().collect();
        }
        let mut out: BTreeSet<String> = BTreeSet::new();
        for attr in [from, to] {
            for column in attr.columns() {
                out.extend(self.column_procedures(table, column).cloned());
            }
        }
        out
    }
}
