// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the partition planner.

use catalog_model::CatalogError;
use cost_model::CostModelError;
use memory_estimator::MemoryError;

/// Errors that can occur while designing a partitioning plan.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The catalog rejected an assignment or a lookup failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The cost model failed to estimate a plan.
    #[error("cost model error: {0}")]
    Cost(#[from] CostModelError),

    /// The memory estimator failed to size a plan.
    #[error("memory estimation error: {0}")]
    Memory(#[from] MemoryError),

    /// Reading or writing the checkpoint file failed.
    #[error("checkpoint I/O on '{path}': {source}")]
    Checkpoint {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The checkpoint file exists but is not a valid search state.
    #[error("malformed checkpoint '{path}': {source}")]
    CheckpointFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A table has no size statistics; the search cannot price memory.
    #[error("no statistics available for table '{0}'")]
    MissingStatistics(String),

    /// No plan fits the per-partition memory budget.
    #[error("plan needs {required_bytes} bytes per partition, budget is {budget_bytes}")]
    InsufficientMemory {
        required_bytes: u64,
        budget_bytes: u64,
    },

    /// The hints cannot drive a terminating search.
    #[error("invalid designer configuration: {0}")]
    Config(String),

    /// An internal consistency check failed. Never recoverable.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
