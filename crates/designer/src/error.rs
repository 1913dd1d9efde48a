// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the designer.

/// Errors that can occur while setting up or running a design.
#[derive(Debug, thiserror::Error)]
pub enum DesignerError {
    /// Loading or validating the catalog failed.
    #[error("catalog error: {0}")]
    CatalogError(#[from] catalog_model::CatalogError),

    /// Loading the workload or building the cost model failed.
    #[error("cost model error: {0}")]
    CostModelError(#[from] cost_model::CostModelError),

    /// The memory budget could not be parsed or estimated.
    #[error("memory error: {0}")]
    MemoryError(#[from] memory_estimator::MemoryError),

    /// The partitioning strategy returned an error.
    #[error("planner error: {0}")]
    PlannerError(#[from] partition_planner::PlannerError),

    /// Writing the plan to disk failed.
    #[error("cannot write plan to '{path}': {source}")]
    OutputError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The blocking search task panicked or was cancelled.
    #[error("design task failed: {0}")]
    TaskError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
