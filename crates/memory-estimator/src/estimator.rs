// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-partition memory footprint estimation.
//!
//! The designer only needs one number from a memory estimator: how many
//! bytes the busiest partition would hold under the catalog's current
//! assignment. [`TableSizeEstimator`] answers that from table statistics
//! alone, assuming rows of a partitioned table spread evenly.

use crate::MemoryError;
use catalog_model::catalog::Validated;
use catalog_model::{Catalog, TableDef};

/// Estimates per-partition memory for the catalog's current assignment.
pub trait MemoryEstimator: Send {
    /// Human-readable estimator name.
    fn name(&self) -> &str;

    /// Bytes held by one partition across all tables.
    fn estimate(&mut self, catalog: &Catalog<Validated>, num_partitions: u32)
        -> Result<u64, MemoryError>;

    /// Bytes held by one partition for the named tables only.
    fn estimate_tables(
        &mut self,
        catalog: &Catalog<Validated>,
        num_partitions: u32,
        tables: &[String],
    ) -> Result<u64, MemoryError>;
}

/// Sizes each table from its statistics.
///
/// - Replicated: `tuple_size_total` on every partition.
/// - Partitioned: `ceil(tuple_size_total / num_partitions)`.
#[derive(Debug, Default, Clone)]
pub struct TableSizeEstimator {
    calls: u64,
}

impl TableSizeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of estimates served so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Bytes `table` contributes to one partition.
    pub fn table_bytes(table: &TableDef, num_partitions: u32) -> Result<u64, MemoryError> {
        let stats = table
            .stats
            .ok_or_else(|| MemoryError::MissingStatistics(table.name.clone()))?;
        if table.is_replicated {
            Ok(stats.tuple_size_total)
        } else {
            Ok(stats.tuple_size_total.div_ceil(u64::from(num_partitions.max(1))))
        }
    }
}

impl MemoryEstimator for TableSizeEstimator {
    fn name(&self) -> &str {
        "table-size"
    }

    fn estimate(
        &mut self,
        catalog: &Catalog<Validated>,
        num_partitions: u32,
    ) -> Result<u64, MemoryError> {
        self.calls += 1;
        let total = catalog
            .tables()
            .map(|t| Self::table_bytes(t, num_partitions))
            .sum::<Result<u64, _>>()?;
        tracing::trace!("estimated {total} bytes per partition over {num_partitions} partitions");
        Ok(total)
    }

    fn estimate_tables(
        &mut self,
        catalog: &Catalog<Validated>,
        num_partitions: u32,
        tables: &[String],
    ) -> Result<u64, MemoryError> {
        self.calls += 1;
        let mut total = 0u64;
        for name in tables {
            let table = catalog
                .table(name)
                .ok_or_else(|| MemoryError::UnknownTable(name.clone()))?;
            total += Self::table_bytes(table, num_partitions)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_model::{PartitionAttribute, TableStats};

    fn stats(bytes: u64) -> Option<TableStats> {
        Some(TableStats {
            tuple_count: bytes / 100,
            tuple_size_total: bytes,
        })
    }

    fn catalog() -> Catalog<Validated> {
        Catalog::new(
            "mem",
            4,
            vec![
                TableDef::new("BIG", &["ID"], stats(1001)),
                TableDef::new("SMALL", &["ID"], stats(400)),
            ],
            vec![],
        )
        .validate()
        .unwrap()
    }

    #[test]
    fn test_partitioned_tables_round_up() {
        let mut est = TableSizeEstimator::new();
        // ceil(1001 / 4) + 400 / 4
        assert_eq!(est.estimate(&catalog(), 4).unwrap(), 251 + 100);
    }

    #[test]
    fn test_replicated_table_full_size() {
        let mut c = catalog();
        c.set_partition_attribute("SMALL", PartitionAttribute::Replicated)
            .unwrap();
        let mut est = TableSizeEstimator::new();
        assert_eq!(est.estimate(&c, 4).unwrap(), 251 + 400);
        assert_eq!(
            est.estimate_tables(&c, 4, &["SMALL".to_string()]).unwrap(),
            400
        );
        assert_eq!(est.calls(), 2);
    }

    #[test]
    fn test_subset_and_errors() {
        let mut est = TableSizeEstimator::new();
        let c = catalog();
        assert_eq!(est.estimate_tables(&c, 4, &[]).unwrap(), 0);
        assert!(matches!(
            est.estimate_tables(&c, 4, &["NOPE".to_string()]),
            Err(MemoryError::UnknownTable(_))
        ));

        let no_stats = Catalog::new("x", 2, vec![TableDef::new("T", &["A"], None)], vec![])
            .validate()
            .unwrap();
        assert!(matches!(
            est.estimate(&no_stats, 2),
            Err(MemoryError::MissingStatistics(_))
        ));
    }
}
