// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memory-estimator
//!
//! Memory accounting for partition plans.
//!
//! # Key Components
//!
//! - [`MemoryBudget`]: the per-partition ceiling with human-readable parsing
//!   (`"512M"`, `"1G"`, `"unbounded"`).
//! - [`MemoryEstimator`]: the trait the designer consumes: bytes held by one
//!   partition for the whole catalog or a subset of its tables.
//! - [`TableSizeEstimator`]: statistics-driven reference estimator.
//!
//! # Example
//! ```
//! use catalog_model::{Catalog, TableDef, TableStats};
//! use memory_estimator::{MemoryBudget, MemoryEstimator, TableSizeEstimator};
//!
//! let stats = Some(TableStats { tuple_count: 10, tuple_size_total: 4096 });
//! let catalog = Catalog::new("demo", 4, vec![TableDef::new("T", &["ID"], stats)], vec![])
//!     .validate()
//!     .unwrap();
//!
//! let mut est = TableSizeEstimator::new();
//! let bytes = est.estimate(&catalog, 4).unwrap();
//! assert_eq!(bytes, 1024);
//! assert!(MemoryBudget::parse("2K").unwrap().admits(bytes));
//! ```

mod budget;
mod error;
mod estimator;

pub use budget::MemoryBudget;
pub use error::MemoryError;
pub use estimator::{MemoryEstimator, TableSizeEstimator};
