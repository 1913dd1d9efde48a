// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for catalog loading and mutation.

/// Errors that can occur when working with the catalog model.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A catalog, workload or correlation file could not be read.
    #[error("failed to read '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The manifest JSON is malformed.
    #[error("failed to parse catalog manifest: {0}")]
    ParseError(#[from] serde_json::Error),

    /// A table name does not resolve in the catalog.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// A column name does not resolve in its table.
    #[error("unknown column '{table}.{column}'")]
    UnknownColumn { table: String, column: String },

    /// A procedure name does not resolve in the catalog.
    #[error("unknown procedure '{0}'")]
    UnknownProcedure(String),

    /// A parameter index is out of range or not usable for partitioning.
    #[error("invalid parameter {index} for procedure '{procedure}': {detail}")]
    InvalidParameter {
        procedure: String,
        index: usize,
        detail: String,
    },

    /// The catalog is structurally invalid (duplicate names, empty tables, ...).
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}
