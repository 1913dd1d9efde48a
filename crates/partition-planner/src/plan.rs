// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Partition plan: the output of the designer.
//!
//! A plan is a total assignment of one [`PartitionAttribute`] per table and
//! one [`PartitionParameter`] per non-system procedure. Plans are values:
//! copying one out of the catalog, applying it back and copying it out
//! again yields an equal plan.

use crate::PlannerError;
use catalog_model::catalog::Validated;
use catalog_model::{Catalog, PartitionAttribute, PartitionParameter};
use std::collections::BTreeMap;
use std::fmt;

/// A snapshot of every table and procedure assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PartitionPlan {
    /// Table name → partitioning attribute.
    pub tables: BTreeMap<String, PartitionAttribute>,
    /// Procedure name → partitioning parameter.
    pub procedures: BTreeMap<String, PartitionParameter>,
}

impl PartitionPlan {
    /// Reads the catalog's current assignment.
    ///
    /// System procedures are not part of a plan.
    pub fn from_catalog(catalog: &Catalog<Validated>) -> Self {
        Self {
            tables: catalog
                .tables()
                .map(|t| (t.name.clone(), t.partition.clone()))
                .collect(),
            procedures: catalog
                .procedures()
                .filter(|p| !p.system)
                .map(|p| (p.name.clone(), p.partition_parameter.clone()))
                .collect(),
        }
    }

    /// Writes every assignment of this plan into the catalog.
    ///
    /// Does not touch any cost-model cache; callers that keep one must
    /// invalidate it.
    pub fn apply(&self, catalog: &mut Catalog<Validated>) -> Result<(), PlannerError> {
        for (table, attribute) in &self.tables {
            catalog.set_partition_attribute(table, attribute.clone())?;
        }
        for (procedure, parameter) in &self.procedures {
            catalog.set_partition_parameter(procedure, parameter.clone())?;
        }
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&PartitionAttribute> {
        self.tables.get(name)
    }

    pub fn procedure(&self, name: &str) -> Option<&PartitionParameter> {
        self.procedures.get(name)
    }

    /// Number of replicated tables.
    pub fn num_replicated(&self) -> usize {
        self.tables.values().filter(|a| a.is_replicated()).count()
    }

    /// Number of procedures without a partitioning parameter.
    pub fn num_unrouted(&self) -> usize {
        self.procedures.values().filter(|p| p.is_null()).count()
    }

    /// Names of tables and procedures whose assignment differs from `other`.
    pub fn diff(&self, other: &PartitionPlan) -> Vec<String> {
        let tables = self
            .tables
            .iter()
            .filter(|(name, attr)| other.tables.get(*name) != Some(*attr))
            .map(|(name, _)| name.clone());
        let procedures = self
            .procedures
            .iter()
            .filter(|(name, param)| other.procedures.get(*name) != Some(*param))
            .map(|(name, _)| name.clone());
        tables.chain(procedures).collect()
    }

    /// Returns a human-readable summary of the plan.
    pub fn summary(&self) -> String {
        format!(
            "Plan: {} tables ({} replicated), {} procedures ({} without partition parameter)",
            self.tables.len(),
            self.num_replicated(),
            self.procedures.len(),
            self.num_unrouted(),
        )
    }
}

impl fmt::Display for PartitionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (table, attr) in &self.tables {
            writeln!(f, "  {table:<24} → {attr}")?;
        }
        for (proc, param) in &self.procedures {
            writeln!(f, "  {proc:<24} → {param}")?;
        }
        Ok(())
    }
}
