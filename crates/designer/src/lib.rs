// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # designer
//!
//! Drives one partitioning-plan design run end to end.
//!
//! The designer takes:
//! - A validated `Catalog` from `catalog-model`.
//! - A `Workload` trace and a `CostModel` from `cost-model`.
//! - A `MemoryEstimator` and budget from `memory-estimator`.
//! - A `PartitionStrategy` from `partition-planner`.
//!
//! And produces a [`DesignOutput`]: the chosen plan, the annotated catalog
//! and per-round search metrics.
//!
//! # Type-State Pipeline
//! ```text
//! Designer<Idle> → Designer<Loaded> → DesignOutput
//! ```
//! Transitions are compile-time checked.
//!
//! # Async Execution
//! The search runs on tokio's blocking pool; `run_blocking` is available
//! for synchronous callers.

mod config;
mod engine;
mod error;
mod metrics;

pub use config::DesignerConfig;
pub use engine::{DesignOutput, Designer, DesignerState, Idle, Loaded};
pub use error::DesignerError;
pub use metrics::{DesignMetrics, RoundMetrics};
