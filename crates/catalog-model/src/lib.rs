// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # catalog-model
//!
//! The schema graph consumed by the partitioning designer:
//!
//! - [`TableDef`] / [`ProcedureDef`]: tables with their columns and size
//!   statistics, procedures with their parameters and column references.
//! - [`PartitionAttribute`] / [`PartitionParameter`]: tagged unions for the
//!   per-table and per-procedure choices, sentinels included.
//! - [`Catalog`]: the whole schema with a **type-state pattern**
//!   (`Loaded` → `Validated`). Only a validated catalog can be mutated.
//! - [`CatalogLoader`] / [`CatalogManifest`]: JSON loading.
//! - [`ParameterCorrelations`]: parameter/column correlation statistics.
//!
//! # Example
//! ```
//! use catalog_model::{Catalog, ColumnRef, PartitionAttribute, ProcedureDef, TableDef};
//!
//! let mut catalog = Catalog::new(
//!     "tpcc",
//!     4,
//!     vec![TableDef::new("WAREHOUSE", &["W_ID", "W_NAME"], None)],
//!     vec![ProcedureDef::new("Payment", &["w_id"], vec![ColumnRef::new("WAREHOUSE", "W_ID")])],
//! )
//! .validate()
//! .unwrap();
//!
//! catalog
//!     .set_partition_attribute("WAREHOUSE", PartitionAttribute::Replicated)
//!     .unwrap();
//! assert!(catalog.table("WAREHOUSE").unwrap().is_replicated);
//! ```

mod attribute;
pub mod catalog;
mod correlation;
mod error;
mod loader;
mod manifest;
mod schema;

pub use attribute::{PartitionAttribute, PartitionParameter};
pub use catalog::Catalog;
pub use correlation::{Correlation, ParameterCorrelations};
pub use error::CatalogError;
pub use loader::CatalogLoader;
pub use manifest::{CatalogManifest, ManifestParameter, ManifestProcedure, ManifestTable};
pub use schema::{ColumnDef, ColumnRef, ParameterDef, ProcedureDef, TableDef, TableStats};
