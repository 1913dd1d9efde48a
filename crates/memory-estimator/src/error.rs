// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for memory estimation.

/// Errors that can occur while parsing budgets or estimating footprints.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// A budget string could not be parsed.
    #[error("invalid memory budget '{input}': {detail}")]
    InvalidBudget { input: String, detail: String },

    /// A table has no size statistics, so its footprint is unknown.
    #[error("no statistics available for table '{0}'")]
    MissingStatistics(String),

    /// A table named in an estimation subset does not exist.
    #[error("unknown table '{0}'")]
    UnknownTable(String),
}
