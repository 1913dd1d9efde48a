// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON catalog manifest parsing.
//!
//! # Format
//! ```json
//! {
//!   "name": "tpcc",
//!   "num_partitions": 8,
//!   "tables": [
//!     {
//!       "name": "WAREHOUSE",
//!       "columns": ["W_ID", "W_NAME"],
//!       "stats": { "tuple_count": 8, "tuple_size_total": 8192 },
//!       "partition": { "kind": "column", "value": "W_ID" }
//!     }
//!   ],
//!   "procedures": [
//!     {
//!       "name": "NewOrder",
//!       "parameters": [{ "name": "w_id" }, { "name": "i_ids", "is_array": true }],
//!       "columns": ["WAREHOUSE.W_ID"]
//!     }
//!   ]
//! }
//! ```

use crate::catalog::Loaded;
use crate::{
    Catalog, CatalogError, ColumnDef, ColumnRef, ParameterDef, PartitionAttribute,
    PartitionParameter, ProcedureDef, TableDef, TableStats,
};
use std::path::Path;

/// Top-level catalog manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CatalogManifest {
    /// Database name.
    pub name: String,
    /// Number of partitions in the target cluster.
    pub num_partitions: u32,
    /// Table definitions.
    pub tables: Vec<ManifestTable>,
    /// Procedure definitions.
    #[serde(default)]
    pub procedures: Vec<ManifestProcedure>,
}

/// A table entry in the manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestTable {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub stats: Option<TableStats>,
    /// Initial attribute; defaults to the first column.
    #[serde(default)]
    pub partition: Option<PartitionAttribute>,
}

/// A procedure parameter entry in the manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestParameter {
    pub name: String,
    #[serde(default)]
    pub is_array: bool,
}

/// A procedure entry in the manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestProcedure {
    pub name: String,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub parameters: Vec<ManifestParameter>,
    /// Referenced columns as `"TABLE.COLUMN"`.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub partition_parameter: PartitionParameter,
}

impl CatalogManifest {
    /// Loads a manifest from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds an unvalidated catalog from the manifest.
    pub fn into_catalog(self) -> Result<Catalog<Loaded>, CatalogError> {
        let tables = self
            .tables
            .into_iter()
            .map(|t| {
                let columns: Vec<ColumnDef> = t
                    .columns
                    .into_iter()
                    .enumerate()
                    .map(|(index, name)| ColumnDef { name, index })
                    .collect();
                let partition = t.partition.unwrap_or_else(|| {
                    columns
                        .first()
                        .map(|c| PartitionAttribute::Column(c.name.clone()))
                        .unwrap_or(PartitionAttribute::Replicated)
                });
                TableDef {
                    name: t.name,
                    columns,
                    stats: t.stats,
                    is_replicated: partition.is_replicated(),
                    partition,
                }
            })
            .collect();

        let procedures = self
            .procedures
            .into_iter()
            .map(|p| {
                let column_refs = p
                    .columns
                    .iter()
                    .map(|s| parse_column_ref(&p.name, s))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ProcedureDef {
                    parameters: p
                        .parameters
                        .into_iter()
                        .enumerate()
                        .map(|(index, mp)| ParameterDef {
                            index,
                            name: mp.name,
                            is_array: mp.is_array,
                        })
                        .collect(),
                    name: p.name,
                    system: p.system,
                    column_refs,
                    partition_parameter: p.partition_parameter,
                    single_partition: false,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Ok(Catalog::new(self.name, self.num_partitions, tables, procedures))
    }
}

/// Parses `"TABLE.COLUMN"`.
fn parse_column_ref(procedure: &str, s: &str) -> Result<ColumnRef, CatalogError> {
    match s.split_once('.') {
        Some((table, column)) if !table.is_empty() && !column.is_empty() => {
            Ok(ColumnRef::new(table, column))
        }
        _ => Err(CatalogError::InvalidCatalog(format!(
            "procedure '{procedure}' has malformed column reference '{s}', expected TABLE.COLUMN"
        ))),
    }
}
