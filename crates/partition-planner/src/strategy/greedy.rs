// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Most-popular-column seeding strategy.
//!
//! Partitions every table on the candidate column the workload filters on
//! most often, then gives every procedure its best-correlated parameter.
//! Tables no traced query filters on are replicated. This is the initial
//! solution the LNS search improves on, and a usable plan by itself.
//!
//! # Memory
//!
//! When a budget is set and the seed does not fit, the largest replicated
//! tables are partitioned again, one at a time, until it does:
//!
//! ```text
//! while memory(plan) > budget:
//!     t = largest replicated table
//!     t → most popular column (else first column)
//!     re-rank procedures referencing t
//! ```

use crate::mutators::{annotate_single_partition, apply_column_swap, recalculate_parameters};
use crate::strategy::PartitionStrategy;
use crate::{DesignContext, DesignerHints, PartitionPlan, PlannerError, SearchIndex};
use catalog_model::{ColumnRef, PartitionAttribute};
use std::collections::HashMap;
use tracing::{debug, info};

/// Column popularity seeding.
#[derive(Debug, Clone, Default)]
pub struct MostPopular;

impl MostPopular {
    pub fn new() -> Self {
        Self
    }
}

impl PartitionStrategy for MostPopular {
    fn name(&self) -> &str {
        "most-popular"
    }

    fn generate(
        &mut self,
        ctx: &mut DesignContext,
        hints: &mut DesignerHints,
    ) -> Result<PartitionPlan, PlannerError> {
        hints.validate()?;
        ctx.reload_correlations()?;
        let index = SearchIndex::build(&ctx.catalog, &ctx.workload, hints)?;
        let plan = seed_plan(ctx, hints, &index)?;
        annotate_single_partition(ctx)?;
        info!(
            "{}: {} replicated tables, {} unrouted procedures",
            self.name(),
            plan.num_replicated(),
            plan.num_unrouted()
        );
        Ok(plan)
    }
}

/// Total access count per column over every traced candidate procedure.
fn column_popularity(index: &SearchIndex) -> HashMap<ColumnRef, u64> {
    let mut popularity: HashMap<ColumnRef, u64> = HashMap::new();
    for procedure in index.procedures() {
        if let Some(histogram) = index.histogram(procedure) {
            for (column, count) in histogram {
                *popularity.entry(column.clone()).or_default() += count;
            }
        }
    }
    popularity
}

/// The single-column candidate of `table` with the highest access count.
/// Ties keep the earlier column; columns never accessed are ignored.
fn most_popular_column(
    index: &SearchIndex,
    popularity: &HashMap<ColumnRef, u64>,
    table: &str,
) -> Option<(PartitionAttribute, u64)> {
    index
        .candidates(table)
        .iter()
        .filter_map(|attr| match attr {
            PartitionAttribute::Column(c) => {
                let count = popularity
                    .get(&ColumnRef::new(table, c))
                    .copied()
                    .unwrap_or(0);
                Some((attr.clone(), count))
            }
            _ => None,
        })
        .filter(|(_, count)| *count > 0)
        .fold(None, |best, (attr, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((attr, count)),
        })
}

/// Column a replicated table falls back to when memory runs short.
fn fallback_column(
    ctx: &DesignContext,
    index: &SearchIndex,
    popularity: &HashMap<ColumnRef, u64>,
    table: &str,
) -> Option<PartitionAttribute> {
    if let Some((attr, _)) = most_popular_column(index, popularity, table) {
        return Some(attr);
    }
    index
        .candidates(table)
        .iter()
        .find(|a| matches!(a, PartitionAttribute::Column(_)))
        .cloned()
        .or_else(|| {
            ctx.catalog
                .table(table)
                .and_then(|t| t.columns.first())
                .map(|c| PartitionAttribute::column(c.name.clone()))
        })
}

/// Builds the most-popular plan into the catalog and returns it.
///
/// Fails with [`PlannerError::InsufficientMemory`] when no replicated
/// table is left to partition and the plan still exceeds the budget.
pub fn seed_plan(
    ctx: &mut DesignContext,
    hints: &DesignerHints,
    index: &SearchIndex,
) -> Result<PartitionPlan, PlannerError> {
    let popularity = column_popularity(index);

    for table in index.tables() {
        let attr = match most_popular_column(index, &popularity, table) {
            Some((attr, count)) => {
                debug!("{table}: most popular column {attr} ({count} accesses)");
                attr
            }
            None => {
                debug!("{table}: never filtered on, replicating");
                PartitionAttribute::Replicated
            }
        };
        apply_column_swap(ctx, hints, table, attr)?;
    }
    recalculate_parameters(ctx, hints, index, index.procedures())?;

    let budget = hints.memory_budget();
    let mut required = ctx.estimate_memory()?;
    while !budget.admits(required) {
        let candidate = index
            .tables()
            .iter()
            .filter(|t| ctx.catalog.table(t).is_some_and(|d| d.is_replicated))
            .filter_map(|t| fallback_column(ctx, index, &popularity, t).map(|a| (t, a)))
            .max_by_key(|(t, _)| index.replicated_size(t));
        let Some((table, attr)) = candidate else {
            return Err(PlannerError::InsufficientMemory {
                required_bytes: required,
                budget_bytes: budget.as_bytes(),
            });
        };
        info!("seed needs {required} bytes per partition (budget {budget}), partitioning {table} on {attr}");
        apply_column_swap(ctx, hints, table, attr)?;
        recalculate_parameters(ctx, hints, index, index.table_procedures(table))?;
        required = ctx.estimate_memory()?;
    }

    Ok(PartitionPlan::from_catalog(&ctx.catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, hints};
    use catalog_model::PartitionParameter;

    fn index_of(ctx: &DesignContext, h: &DesignerHints) -> SearchIndex {
        SearchIndex::build(&ctx.catalog, &ctx.workload, h).unwrap()
    }

    /// Drops every ITEM access so ITEM is seeded replicated.
    fn without_item_traffic(ctx: &mut DesignContext) {
        ctx.workload.transactions.retain(|t| t.procedure != "GetItem");
        for txn in &mut ctx.workload.transactions {
            txn.queries.retain(|q| q.table != "ITEM");
        }
    }

    #[test]
    fn test_seed_picks_most_popular_columns() {
        let mut ctx = context();
        let h = hints();
        let index = index_of(&ctx, &h);
        let plan = seed_plan(&mut ctx, &h, &index).unwrap();

        assert_eq!(plan.table("WAREHOUSE"), Some(&PartitionAttribute::column("W_ID")));
        // D_ID and D_W_ID tie; the earlier column wins.
        assert_eq!(plan.table("DISTRICT"), Some(&PartitionAttribute::column("D_ID")));
        assert_eq!(plan.table("CUSTOMER"), Some(&PartitionAttribute::column("C_ID")));
        assert_eq!(plan.table("ITEM"), Some(&PartitionAttribute::column("I_ID")));
        assert_eq!(
            plan.procedure("GetItem"),
            Some(&PartitionParameter::Parameter(0))
        );
        assert_eq!(plan, PartitionPlan::from_catalog(&ctx.catalog));
    }

    #[test]
    fn test_unaccessed_table_is_replicated() {
        let mut ctx = context();
        without_item_traffic(&mut ctx);
        let h = hints();
        let index = index_of(&ctx, &h);
        let plan = seed_plan(&mut ctx, &h, &index).unwrap();
        assert_eq!(plan.table("ITEM"), Some(&PartitionAttribute::Replicated));
        assert_eq!(plan.num_replicated(), 1);
    }

    #[test]
    fn test_over_budget_seed_partitions_replicated_table() {
        let mut ctx = context();
        without_item_traffic(&mut ctx);
        // Partitioned: 100 + 1000 + 20000 + 2500 = 23600; ITEM replicated adds 7500.
        let h = DesignerHints {
            max_memory_per_partition: 25_000,
            ..hints()
        };
        let index = index_of(&ctx, &h);
        let plan = seed_plan(&mut ctx, &h, &index).unwrap();
        assert_eq!(plan.table("ITEM"), Some(&PartitionAttribute::column("I_ID")));
        assert_eq!(ctx.estimate_memory().unwrap(), 23_600);
    }

    #[test]
    fn test_insufficient_memory() {
        let mut ctx = context();
        let h = DesignerHints {
            max_memory_per_partition: 20_000,
            ..hints()
        };
        let index = index_of(&ctx, &h);
        let err = seed_plan(&mut ctx, &h, &index).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::InsufficientMemory {
                required_bytes: 23_600,
                budget_bytes: 20_000
            }
        ));
    }

    #[test]
    fn test_generate_annotates_procedures() {
        let mut ctx = context();
        let mut h = hints();
        let mut strategy = MostPopular::new();
        assert_eq!(strategy.name(), "most-popular");
        let plan = strategy.generate(&mut ctx, &mut h).unwrap();
        assert_eq!(plan.num_unrouted(), 0);
        assert!(ctx.catalog.procedure("Payment").unwrap().single_partition);
        assert!(strategy.rounds().is_empty());
    }
}
