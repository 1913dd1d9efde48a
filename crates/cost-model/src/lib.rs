// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # cost-model
//!
//! Workload traces and the cost interface the partitioning designer
//! optimises against.
//!
//! - [`Workload`]: traced transactions with parameter values and query
//!   predicates, plus per-procedure [`ColumnHistogram`]s.
//! - [`CostModel`]: stateful estimator; callers only see invalidation and
//!   clearing, never the cache itself.
//! - [`SingleSitedCostModel`]: reference model: distributed-transaction
//!   penalty plus entropy-weighted partition skew.

mod error;
mod model;
mod single_sited;
mod workload;

pub use error::CostModelError;
pub use model::CostModel;
pub use single_sited::{
    partition_of, CostModelStats, SingleSitedCostModel, DEFAULT_MULTI_PARTITION_PENALTY,
};
pub use workload::{ColumnHistogram, ParamValue, QueryTrace, TransactionTrace, Workload};
