// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The catalog: tables, procedures and their current assignments.
//!
//! # Type-State Pattern
//!
//! ```text
//! Catalog<Loaded>    : definitions parsed, references not yet checked.
//!       │  .validate()
//!       ▼
//! Catalog<Validated> : names unique, references resolved, ready for design.
//! ```
//!
//! Only a validated catalog exposes the assignment setters, so the designer
//! can never write into a catalog whose references were not resolved.

use crate::{CatalogError, PartitionAttribute, PartitionParameter, ProcedureDef, TableDef};
use std::collections::{HashMap, HashSet};
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: catalog has been loaded but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: catalog has been validated.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for catalog states.
pub trait CatalogState: fmt::Debug + Clone {}
impl CatalogState for Loaded {}
impl CatalogState for Validated {}

// ── Catalog ────────────────────────────────────────────────────────

/// A database schema together with its current partitioning assignment.
#[derive(Debug, Clone)]
pub struct Catalog<S: CatalogState = Loaded> {
    /// Database name.
    pub name: String,
    /// Number of partitions in the target cluster.
    pub num_partitions: u32,
    tables: Vec<TableDef>,
    procedures: Vec<ProcedureDef>,
    table_index: HashMap<String, usize>,
    procedure_index: HashMap<String, usize>,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl Catalog<Loaded> {
    /// Creates a new catalog in the `Loaded` state.
    pub fn new(
        name: impl Into<String>,
        num_partitions: u32,
        tables: Vec<TableDef>,
        procedures: Vec<ProcedureDef>,
    ) -> Self {
        Self {
            name: name.into(),
            num_partitions,
            tables,
            procedures,
            table_index: HashMap::new(),
            procedure_index: HashMap::new(),
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the catalog and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - At least one partition.
    /// - Table, column and procedure names are unique.
    /// - Every procedure column reference resolves.
    /// - Current assignments are legal for their table/procedure, and the
    ///   replicated flag agrees with the attribute.
    pub fn validate(self) -> Result<Catalog<Validated>, CatalogError> {
        if self.num_partitions == 0 {
            return Err(CatalogError::InvalidCatalog(
                "catalog must have at least one partition".into(),
            ));
        }

        let mut table_index = HashMap::with_capacity(self.tables.len());
        for (i, table) in self.tables.iter().enumerate() {
            if table_index.insert(table.name.clone(), i).is_some() {
                return Err(CatalogError::InvalidCatalog(format!(
                    "duplicate table '{}'",
                    table.name
                )));
            }
            let mut seen = HashSet::new();
            for column in &table.columns {
                if !seen.insert(column.name.as_str()) {
                    return Err(CatalogError::InvalidCatalog(format!(
                        "duplicate column '{}.{}'",
                        table.name, column.name
                    )));
                }
            }
            if !table.supports(&table.partition) {
                return Err(CatalogError::UnknownColumn {
                    table: table.name.clone(),
                    column: table.partition.to_string(),
                });
            }
            if table.is_replicated != table.partition.is_replicated() {
                return Err(CatalogError::InvalidCatalog(format!(
                    "table '{}' replicated flag disagrees with attribute {}",
                    table.name, table.partition
                )));
            }
        }

        let mut procedure_index = HashMap::with_capacity(self.procedures.len());
        for (i, proc) in self.procedures.iter().enumerate() {
            if procedure_index.insert(proc.name.clone(), i).is_some() {
                return Err(CatalogError::InvalidCatalog(format!(
                    "duplicate procedure '{}'",
                    proc.name
                )));
            }
            for r in &proc.column_refs {
                let table = table_index
                    .get(&r.table)
                    .map(|&t| &self.tables[t])
                    .ok_or_else(|| CatalogError::UnknownTable(r.table.clone()))?;
                if table.column(&r.column).is_none() {
                    return Err(CatalogError::UnknownColumn {
                        table: r.table.clone(),
                        column: r.column.clone(),
                    });
                }
            }
            check_parameter(proc, &proc.partition_parameter)?;
        }

        Ok(Catalog {
            name: self.name,
            num_partitions: self.num_partitions,
            tables: self.tables,
            procedures: self.procedures,
            table_index,
            procedure_index,
            _state: std::marker::PhantomData,
        })
    }
}

// ── Validated state ────────────────────────────────────────────────

impl Catalog<Validated> {
    /// Returns the number of tables.
    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// Iterates over tables in catalog order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.iter()
    }

    /// Iterates over procedures in catalog order.
    pub fn procedures(&self) -> impl Iterator<Item = &ProcedureDef> {
        self.procedures.iter()
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.table_index.get(name).map(|&i| &self.tables[i])
    }

    /// Looks up a procedure by name.
    pub fn procedure(&self, name: &str) -> Option<&ProcedureDef> {
        self.procedure_index.get(name).map(|&i| &self.procedures[i])
    }

    /// Sets a table's partitioning attribute and replicated flag.
    ///
    /// Returns the previous attribute.
    pub fn set_partition_attribute(
        &mut self,
        table: &str,
        attribute: PartitionAttribute,
    ) -> Result<PartitionAttribute, CatalogError> {
        let idx = *self
            .table_index
            .get(table)
            .ok_or_else(|| CatalogError::UnknownTable(table.to_string()))?;
        let def = &mut self.tables[idx];
        if !def.supports(&attribute) {
            return Err(CatalogError::UnknownColumn {
                table: table.to_string(),
                column: attribute.to_string(),
            });
        }
        def.is_replicated = attribute.is_replicated();
        Ok(std::mem::replace(&mut def.partition, attribute))
    }

    /// Sets a procedure's partitioning parameter.
    ///
    /// Returns the previous parameter.
    pub fn set_partition_parameter(
        &mut self,
        procedure: &str,
        parameter: PartitionParameter,
    ) -> Result<PartitionParameter, CatalogError> {
        let idx = *self
            .procedure_index
            .get(procedure)
            .ok_or_else(|| CatalogError::UnknownProcedure(procedure.to_string()))?;
        let def = &mut self.procedures[idx];
        check_parameter(def, &parameter)?;
        Ok(std::mem::replace(&mut def.partition_parameter, parameter))
    }

    /// Records whether a procedure is single-partitioned under the current plan.
    pub fn set_single_partition(
        &mut self,
        procedure: &str,
        single_partition: bool,
    ) -> Result<(), CatalogError> {
        let idx = *self
            .procedure_index
            .get(procedure)
            .ok_or_else(|| CatalogError::UnknownProcedure(procedure.to_string()))?;
        self.procedures[idx].single_partition = single_partition;
        Ok(())
    }

    /// Procedures whose statements reference `table`.
    pub fn referencing_procedures(&self, table: &str) -> Vec<&ProcedureDef> {
        self.procedures
            .iter()
            .filter(|p| p.references_table(table))
            .collect()
    }

    /// Procedures whose statements reference `table.column`.
    pub fn referencing_procedures_of_column(&self, table: &str, column: &str) -> Vec<&ProcedureDef> {
        self.procedures
            .iter()
            .filter(|p| p.references_column(table, column))
            .collect()
    }

    /// Returns a summary string describing the catalog.
    pub fn summary(&self) -> String {
        let replicated = self.tables.iter().filter(|t| t.is_replicated).count();
        let system = self.procedures.iter().filter(|p| p.system).count();
        format!(
            "Catalog '{}': {} partitions, {} tables ({} replicated), {} procedures ({} system)",
            self.name,
            self.num_partitions,
            self.tables.len(),
            replicated,
            self.procedures.len(),
            system,
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: CatalogState> fmt::Display for Catalog<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Catalog '{}' ({} partitions):",
            self.name, self.num_partitions
        )?;
        for table in &self.tables {
            writeln!(f, "  {}", table.summary())?;
        }
        for proc in &self.procedures {
            writeln!(f, "  {}", proc.summary())?;
        }
        Ok(())
    }
}

fn check_parameter(proc: &ProcedureDef, parameter: &PartitionParameter) -> Result<(), CatalogError> {
    for index in parameter.indices() {
        let def = proc
            .parameter(index)
            .ok_or_else(|| CatalogError::InvalidParameter {
                procedure: proc.name.clone(),
                index,
                detail: format!("procedure has {} parameters", proc.parameters.len()),
            })?;
        if def.is_array {
            return Err(CatalogError::InvalidParameter {
                procedure: proc.name.clone(),
                index,
                detail: "array parameters cannot route invocations".into(),
            });
        }
    }
    Ok(())
}
