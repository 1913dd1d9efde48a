// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for workload loading and cost estimation.

/// Errors that can occur while loading a workload or estimating its cost.
#[derive(Debug, thiserror::Error)]
pub enum CostModelError {
    /// Failed to read a workload file from disk.
    #[error("failed to read workload '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse workload JSON.
    #[error("failed to parse workload JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// A trace names a procedure the catalog does not define.
    #[error("workload references unknown procedure '{0}'")]
    UnknownProcedure(String),

    /// A trace queries a table the catalog does not define.
    #[error("workload references unknown table '{0}'")]
    UnknownTable(String),

    /// Cost weights are unusable.
    #[error("invalid cost model weights: {0}")]
    InvalidWeights(String),
}
