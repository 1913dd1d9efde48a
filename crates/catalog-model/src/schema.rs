// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Table and procedure definitions.
//!
//! Each [`TableDef`] carries its columns, optional size statistics and its
//! *current* partitioning attribute. Each [`ProcedureDef`] carries its
//! parameters, the columns its statements reference and its *current*
//! partitioning parameter. The current-assignment fields are the only
//! mutable part of the catalog during a search.

use crate::{PartitionAttribute, PartitionParameter};
use std::fmt;

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColumnDef {
    /// Column name, unique within its table.
    pub name: String,
    /// Ordinal position in the table.
    pub index: usize,
}

/// Size statistics gathered for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TableStats {
    /// Number of tuples in the sample database.
    pub tuple_count: u64,
    /// Total bytes of all tuples.
    pub tuple_size_total: u64,
}

/// A table in the catalog.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TableDef {
    /// Table name, unique within the catalog.
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<ColumnDef>,
    /// Size statistics, if they were collected.
    pub stats: Option<TableStats>,
    /// Current partitioning attribute.
    pub partition: PartitionAttribute,
    /// Mirrors `partition == Replicated`; kept as a field because the data
    /// plane reads it directly.
    pub is_replicated: bool,
}

impl TableDef {
    /// Creates a table partitioned on its first column (or replicated if it
    /// has none).
    pub fn new(name: impl Into<String>, columns: &[&str], stats: Option<TableStats>) -> Self {
        let columns: Vec<ColumnDef> = columns
            .iter()
            .enumerate()
            .map(|(index, c)| ColumnDef {
                name: (*c).to_string(),
                index,
            })
            .collect();
        let partition = columns
            .first()
            .map(|c| PartitionAttribute::Column(c.name.clone()))
            .unwrap_or(PartitionAttribute::Replicated);
        let is_replicated = partition.is_replicated();
        Self {
            name: name.into(),
            columns,
            stats,
            partition,
            is_replicated,
        }
    }

    /// Returns the column with the given name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns `true` if every column the attribute names exists.
    pub fn supports(&self, attribute: &PartitionAttribute) -> bool {
        match attribute {
            PartitionAttribute::Replicated => true,
            PartitionAttribute::MultiColumn(cs) if cs.is_empty() => false,
            other => other.columns().iter().all(|c| self.column(c).is_some()),
        }
    }

    /// One-line description.
    pub fn summary(&self) -> String {
        let size = self
            .stats
            .map(|s| format!("{} tuples, {} bytes", s.tuple_count, s.tuple_size_total))
            .unwrap_or_else(|| "no stats".to_string());
        format!(
            "{:<20} {:>2} columns  partition={}  ({size})",
            self.name,
            self.columns.len(),
            self.partition,
        )
    }
}

/// A stored-procedure input parameter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParameterDef {
    /// Position in the procedure signature.
    pub index: usize,
    /// Parameter name.
    pub name: String,
    /// Array parameters can never route an invocation.
    pub is_array: bool,
}

/// A `(table, column)` reference made by a procedure's statements.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// A stored procedure in the catalog.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProcedureDef {
    /// Procedure name, unique within the catalog.
    pub name: String,
    /// System procedures are never partitioned by the designer.
    pub system: bool,
    /// Parameters in signature order.
    pub parameters: Vec<ParameterDef>,
    /// Columns referenced by the procedure's statements.
    pub column_refs: Vec<ColumnRef>,
    /// Current partitioning parameter.
    pub partition_parameter: PartitionParameter,
    /// Set after a design run: whether invocations route to one partition.
    pub single_partition: bool,
}

impl ProcedureDef {
    /// Creates a non-system procedure with scalar parameters and no
    /// partitioning parameter.
    pub fn new(name: impl Into<String>, params: &[&str], column_refs: Vec<ColumnRef>) -> Self {
        Self {
            name: name.into(),
            system: false,
            parameters: params
                .iter()
                .enumerate()
                .map(|(index, p)| ParameterDef {
                    index,
                    name: (*p).to_string(),
                    is_array: false,
                })
                .collect(),
            column_refs,
            partition_parameter: PartitionParameter::Null,
            single_partition: false,
        }
    }

    /// Returns the parameter at `index`.
    pub fn parameter(&self, index: usize) -> Option<&ParameterDef> {
        self.parameters.get(index)
    }

    /// Iterates over parameters that may be used for routing.
    pub fn scalar_parameters(&self) -> impl Iterator<Item = &ParameterDef> {
        self.parameters.iter().filter(|p| !p.is_array)
    }

    /// Returns `true` if the procedure can be given a partitioning parameter.
    pub fn is_partitionable(&self) -> bool {
        !self.system && !self.parameters.is_empty()
    }

    /// Returns `true` if any statement references `table`.
    pub fn references_table(&self, table: &str) -> bool {
        self.column_refs.iter().any(|r| r.table == table)
    }

    /// Returns `true` if any statement references `table.column`.
    pub fn references_column(&self, table: &str, column: &str) -> bool {
        self.column_refs
            .iter()
            .any(|r| r.table == table && r.column == column)
    }

    /// One-line description.
    pub fn summary(&self) -> String {
        format!(
            "{:<20} {:>2} params  {:>2} column refs  partition={}{}",
            self.name,
            self.parameters.len(),
            self.column_refs.len(),
            self.partition_parameter,
            if self.system { "  [system]" } else { "" },
        )
    }
}
