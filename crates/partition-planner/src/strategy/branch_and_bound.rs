// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bounded branch-and-bound over a restricted neighborhood.
//!
//! [`BoundedLocalSearch`] explores assignments for a set of *free* tables
//! and procedures while every other table and procedure keeps the value it
//! has in the baseline plan. The search tree has one level per free table
//! followed by one level per free procedure:
//!
//! ```text
//! depth 0 .. T-1     tables      candidates: attributes
//! depth T .. T+P-1   procedures  candidates: parameters, current first
//! depth T+P          leaf        accept if cost < incumbent and memory
//!                                fits both the bound and the budget
//! ```
//!
//! After a column swap the free procedures referencing the table are
//! re-ranked, so procedure levels start from the best-correlated value
//! under the attributes above them. A node is pruned when the tables
//! assigned so far exceed the relaxed memory budget or when its cost
//! already exceeds the incumbent.
//!
//! The search halts early when the backtrack or time limit is reached;
//! a search that returns without halting has explored its whole tree.

use crate::mutators::{
    annotate_single_partition, apply_column_swap, apply_parameter_swap, apply_parameter_swaps,
    apply_plan, recalculate_parameters,
};
use crate::strategy::greedy::seed_plan;
use crate::strategy::PartitionStrategy;
use crate::{now_ms, DesignContext, DesignerHints, PartitionPlan, PlannerError, SearchIndex};
use catalog_model::{CatalogError, PartitionAttribute, PartitionParameter};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// The incumbent a local search must beat.
#[derive(Debug, Clone, PartialEq)]
pub struct UpperBounds {
    pub plan: PartitionPlan,
    pub cost: f64,
    /// Per-partition bytes an accepted leaf may use; `0` means unbounded.
    pub memory_bytes: u64,
}

impl UpperBounds {
    /// Returns `true` if a leaf needing `bytes` fits under the bound.
    pub fn admits_memory(&self, bytes: u64) -> bool {
        self.memory_bytes == 0 || bytes <= self.memory_bytes
    }
}

/// Stop conditions of one local search. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchLimits {
    pub back_tracks: Option<u64>,
    pub time: Option<Duration>,
}

/// One neighborhood to explore.
#[derive(Debug, Clone)]
pub struct LocalSearchRequest {
    /// Free tables with the attributes to try, in search order.
    pub tables: Vec<(String, Vec<PartitionAttribute>)>,
    /// Free procedures with the parameters to try, in search order.
    pub procedures: Vec<(String, Vec<PartitionParameter>)>,
    pub bounds: UpperBounds,
    /// Per-partition bytes the free tables may use together.
    pub memory_budget: Option<u64>,
    pub limits: SearchLimits,
}

/// What a local search found.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSearchOutcome {
    pub plan: PartitionPlan,
    /// Exact cost of `plan`, estimated on a cleared cache.
    pub cost: f64,
    pub memory_bytes: u64,
    /// `true` if `plan` beats the upper bounds.
    pub improved: bool,
    /// `true` if the whole tree was explored.
    pub exhausted: bool,
    pub nodes: u64,
    pub back_tracks: u64,
}

/// Depth-first branch-and-bound over one [`LocalSearchRequest`].
pub struct BoundedLocalSearch<'a> {
    index: &'a SearchIndex,
    hints: &'a DesignerHints,
    request: &'a LocalSearchRequest,
    free_procedures: BTreeSet<String>,
    started: Instant,
    incumbent_cost: f64,
    incumbent: Option<PartitionPlan>,
    nodes: u64,
    back_tracks: u64,
    halted: bool,
}

impl<'a> BoundedLocalSearch<'a> {
    pub fn new(
        index: &'a SearchIndex,
        hints: &'a DesignerHints,
        request: &'a LocalSearchRequest,
    ) -> Self {
        Self {
            index,
            hints,
            request,
            free_procedures: request.procedures.iter().map(|(p, _)| p.clone()).collect(),
            started: Instant::now(),
            incumbent_cost: request.bounds.cost,
            incumbent: None,
            nodes: 0,
            back_tracks: 0,
            halted: false,
        }
    }

    /// Runs the search. On return the catalog holds the outcome's plan.
    pub fn run(mut self, ctx: &mut DesignContext) -> Result<LocalSearchOutcome, PlannerError> {
        let request = self.request;
        debug!(
            "local search: {} tables, {} procedures, bound cost {:.6} memory {} bytes, limits {:?}",
            request.tables.len(),
            request.procedures.len(),
            request.bounds.cost,
            request.bounds.memory_bytes,
            request.limits,
        );
        apply_plan(ctx, &request.bounds.plan)?;
        // Free procedures start from their ranked parameter under the
        // baseline attributes.
        let free: Vec<String> = request.procedures.iter().map(|(p, _)| p.clone()).collect();
        apply_parameter_swaps(
            ctx,
            self.hints,
            free.iter().map(|p| (p.clone(), PartitionParameter::Null)),
        )?;
        recalculate_parameters(ctx, self.hints, self.index, &free)?;

        self.started = Instant::now();
        self.search(ctx, 0)?;

        let exhausted = !self.halted;
        let (plan, improved) = match self.incumbent.take() {
            Some(plan) => (plan, true),
            None => (request.bounds.plan.clone(), false),
        };
        apply_plan(ctx, &plan)?;
        ctx.cost_model.clear(true);
        let cost = ctx.estimate_cost()?;
        let memory_bytes = ctx.estimate_memory()?;
        debug!(
            "local search done: cost {cost:.6} improved={improved} exhausted={exhausted} nodes={} back_tracks={} in {:?}",
            self.nodes,
            self.back_tracks,
            self.started.elapsed(),
        );
        Ok(LocalSearchOutcome {
            plan,
            cost,
            memory_bytes,
            improved,
            exhausted,
            nodes: self.nodes,
            back_tracks: self.back_tracks,
        })
    }

    fn should_halt(&mut self) -> bool {
        if self.halted {
            return true;
        }
        let limits = self.request.limits;
        if limits.back_tracks.is_some_and(|max| self.back_tracks >= max) {
            debug!("back-track limit reached after {} nodes", self.nodes);
            self.halted = true;
        } else if limits.time.is_some_and(|max| self.started.elapsed() >= max) {
            debug!("local time limit reached after {} nodes", self.nodes);
            self.halted = true;
        }
        self.halted
    }

    fn search(&mut self, ctx: &mut DesignContext, depth: usize) -> Result<(), PlannerError> {
        let num_tables = self.request.tables.len();
        if depth == num_tables + self.request.procedures.len() {
            self.visit_leaf(ctx)
        } else if depth < num_tables {
            self.branch_table(ctx, depth)
        } else {
            self.branch_procedure(ctx, depth - num_tables)
        }
    }

    fn branch_table(&mut self, ctx: &mut DesignContext, level: usize) -> Result<(), PlannerError> {
        let request = self.request;
        let (table, candidates) = &request.tables[level];
        let original = ctx
            .catalog
            .table(table)
            .map(|t| t.partition.clone())
            .ok_or_else(|| CatalogError::UnknownTable(table.clone()))?;
        let assigned: Vec<String> = request.tables[..=level]
            .iter()
            .map(|(t, _)| t.clone())
            .collect();

        let mut current = original.clone();
        for attr in candidates {
            if self.should_halt() {
                break;
            }
            apply_column_swap(ctx, self.hints, table, attr.clone())?;
            let rerank: Vec<String> = self
                .index
                .affected_procedures(table, &current, attr)
                .into_iter()
                .filter(|p| self.free_procedures.contains(p))
                .collect();
            recalculate_parameters(ctx, self.hints, self.index, &rerank)?;
            current = attr.clone();
            self.nodes += 1;

            if let Some(budget) = request.memory_budget {
                let memory = ctx.estimate_memory_of(&assigned)?;
                if memory > budget {
                    trace!("{table} → {attr}: {memory} bytes exceeds {budget}, pruned");
                    self.back_tracks += 1;
                    continue;
                }
            }
            let cost = ctx.estimate_cost()?;
            if cost > self.incumbent_cost {
                trace!("{table} → {attr}: cost {cost:.6} > {:.6}, pruned", self.incumbent_cost);
                self.back_tracks += 1;
                continue;
            }
            self.search(ctx, level + 1)?;
            self.back_tracks += 1;
        }

        apply_column_swap(ctx, self.hints, table, original)?;
        Ok(())
    }

    fn branch_procedure(
        &mut self,
        ctx: &mut DesignContext,
        level: usize,
    ) -> Result<(), PlannerError> {
        let request = self.request;
        let (procedure, candidates) = &request.procedures[level];
        let original = ctx
            .catalog
            .procedure(procedure)
            .map(|p| p.partition_parameter.clone())
            .ok_or_else(|| CatalogError::UnknownProcedure(procedure.clone()))?;
        let next = request.tables.len() + level + 1;

        let ordered = std::iter::once(&original).chain(candidates.iter().filter(|c| **c != original));
        for param in ordered {
            if self.should_halt() {
                break;
            }
            apply_parameter_swap(ctx, self.hints, procedure, param.clone())?;
            self.nodes += 1;
            let cost = ctx.estimate_cost()?;
            if cost > self.incumbent_cost {
                trace!("{procedure} → {param}: cost {cost:.6} > {:.6}, pruned", self.incumbent_cost);
                self.back_tracks += 1;
                continue;
            }
            self.search(ctx, next)?;
            self.back_tracks += 1;
        }

        apply_parameter_swap(ctx, self.hints, procedure, original)?;
        Ok(())
    }

    fn visit_leaf(&mut self, ctx: &mut DesignContext) -> Result<(), PlannerError> {
        let cost = ctx.estimate_cost()?;
        if cost >= self.incumbent_cost {
            return Ok(());
        }
        let memory = ctx.estimate_memory()?;
        if !self.hints.memory_budget().admits(memory)
            || !self.request.bounds.admits_memory(memory)
        {
            trace!("leaf at cost {cost:.6} needs {memory} bytes, rejected");
            return Ok(());
        }
        debug!(
            "new incumbent: cost {cost:.6} (was {:.6}), {memory} bytes",
            self.incumbent_cost
        );
        self.incumbent_cost = cost;
        self.incumbent = Some(PartitionPlan::from_catalog(&ctx.catalog));
        Ok(())
    }
}

/// Plain branch-and-bound over the whole catalog, seeded with
/// [`MostPopular`](crate::MostPopular).
///
/// Every table and procedure in the search universe is free. Without a
/// backtrack or time limit this enumerates the full space, so it is only
/// practical for small catalogs.
#[derive(Debug, Clone, Default)]
pub struct BranchAndBound {
    last: Option<LocalSearchOutcome>,
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome of the last [`generate`](PartitionStrategy::generate) call.
    pub fn last_outcome(&self) -> Option<&LocalSearchOutcome> {
        self.last.as_ref()
    }
}

impl PartitionStrategy for BranchAndBound {
    fn name(&self) -> &str {
        "branch-and-bound"
    }

    fn generate(
        &mut self,
        ctx: &mut DesignContext,
        hints: &mut DesignerHints,
    ) -> Result<PartitionPlan, PlannerError> {
        hints.validate()?;
        ctx.cost_model.set_entropy_weight(hints.weight_costmodel_entropy);
        ctx.reload_correlations()?;
        let index = SearchIndex::build(&ctx.catalog, &ctx.workload, hints)?;

        let seed = seed_plan(ctx, hints, &index)?;
        apply_plan(ctx, &seed)?;
        let budget = hints.memory_budget();
        let bounds = UpperBounds {
            plan: seed,
            cost: ctx.estimate_cost()?,
            memory_bytes: budget.as_bytes(),
        };
        let request = LocalSearchRequest {
            tables: index
                .tables()
                .iter()
                .map(|t| (t.clone(), index.candidates(t).to_vec()))
                .collect(),
            procedures: index
                .procedures()
                .iter()
                .map(|p| (p.clone(), index.parameter_candidates(p).to_vec()))
                .collect(),
            bounds,
            memory_budget: (!budget.is_unbounded()).then(|| budget.as_bytes()),
            limits: SearchLimits {
                back_tracks: hints.limit_back_tracks,
                time: hints.local_time_limit(now_ms()),
            },
        };

        let outcome = BoundedLocalSearch::new(&index, hints, &request).run(ctx)?;
        annotate_single_partition(ctx)?;
        info!(
            "{}: cost {:.6} → {:.6} ({} nodes, exhausted={})",
            self.name(),
            request.bounds.cost,
            outcome.cost,
            outcome.nodes,
            outcome.exhausted
        );
        let plan = outcome.plan.clone();
        self.last = Some(outcome);
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, hints};
    use crate::MostPopular;

    fn seeded() -> (DesignContext, DesignerHints, SearchIndex, UpperBounds) {
        let mut ctx = context();
        let h = hints();
        let index = SearchIndex::build(&ctx.catalog, &ctx.workload, &h).unwrap();
        let plan = seed_plan(&mut ctx, &h, &index).unwrap();
        let bounds = UpperBounds {
            plan,
            cost: ctx.estimate_cost().unwrap(),
            memory_bytes: 0,
        };
        (ctx, h, index, bounds)
    }

    fn request_for(
        index: &SearchIndex,
        bounds: UpperBounds,
        tables: &[&str],
        limits: SearchLimits,
    ) -> LocalSearchRequest {
        let tables: Vec<(String, Vec<PartitionAttribute>)> = tables
            .iter()
            .map(|t| (t.to_string(), index.candidates(t).to_vec()))
            .collect();
        let procedures: BTreeSet<String> = tables
            .iter()
            .flat_map(|(t, _)| index.table_procedures(t).cloned())
            .collect();
        LocalSearchRequest {
            tables,
            procedures: procedures
                .into_iter()
                .map(|p| {
                    let c = index.parameter_candidates(&p).to_vec();
                    (p, c)
                })
                .collect(),
            bounds,
            memory_budget: None,
            limits,
        }
    }

    #[test]
    fn test_empty_neighborhood_keeps_bounds() {
        let (mut ctx, h, index, bounds) = seeded();
        let request = request_for(&index, bounds.clone(), &[], SearchLimits::default());
        let outcome = BoundedLocalSearch::new(&index, &h, &request)
            .run(&mut ctx)
            .unwrap();
        assert!(!outcome.improved);
        assert!(outcome.exhausted);
        assert_eq!(outcome.plan, bounds.plan);
        assert!((outcome.cost - bounds.cost).abs() < 1e-9);
    }

    #[test]
    fn test_never_worse_than_bounds() {
        let (mut ctx, h, index, bounds) = seeded();
        let request = request_for(
            &index,
            bounds.clone(),
            &["DISTRICT", "CUSTOMER"],
            SearchLimits::default(),
        );
        let outcome = BoundedLocalSearch::new(&index, &h, &request)
            .run(&mut ctx)
            .unwrap();
        assert!(outcome.exhausted);
        assert!(outcome.cost <= bounds.cost + 1e-9);
        assert!(outcome.nodes > 0);
        // Tables outside the neighborhood are untouched.
        assert_eq!(outcome.plan.table("WAREHOUSE"), bounds.plan.table("WAREHOUSE"));
        assert_eq!(outcome.plan.table("ITEM"), bounds.plan.table("ITEM"));
        assert_eq!(outcome.plan, PartitionPlan::from_catalog(&ctx.catalog));
    }

    #[test]
    fn test_improves_a_poor_baseline() {
        let (mut ctx, h, index, mut bounds) = seeded();
        // Route Payment nowhere: every Payment transaction is distributed.
        bounds
            .plan
            .procedures
            .insert("Payment".into(), PartitionParameter::Null);
        apply_plan(&mut ctx, &bounds.plan).unwrap();
        bounds.cost = ctx.estimate_cost().unwrap();

        let request = request_for(&index, bounds.clone(), &["CUSTOMER"], SearchLimits::default());
        let outcome = BoundedLocalSearch::new(&index, &h, &request)
            .run(&mut ctx)
            .unwrap();
        assert!(outcome.improved);
        assert!(outcome.cost < bounds.cost);
        assert!(!outcome.plan.procedure("Payment").unwrap().is_null());
    }

    #[test]
    fn test_back_track_limit_halts() {
        let (mut ctx, h, index, bounds) = seeded();
        let request = request_for(
            &index,
            bounds,
            &["WAREHOUSE", "DISTRICT", "CUSTOMER", "ITEM"],
            SearchLimits {
                back_tracks: Some(1),
                time: None,
            },
        );
        let outcome = BoundedLocalSearch::new(&index, &h, &request)
            .run(&mut ctx)
            .unwrap();
        assert!(!outcome.exhausted);
        assert!(outcome.back_tracks >= 1);
    }

    #[test]
    fn test_memory_budget_prunes_replication() {
        let (mut ctx, h, index, bounds) = seeded();
        let mut request = request_for(&index, bounds, &["CUSTOMER"], SearchLimits::default());
        // CUSTOMER partitioned needs 20000 bytes, replicated 80000.
        request.memory_budget = Some(20_000);
        let outcome = BoundedLocalSearch::new(&index, &h, &request)
            .run(&mut ctx)
            .unwrap();
        assert_ne!(
            outcome.plan.table("CUSTOMER"),
            Some(&PartitionAttribute::Replicated)
        );
    }

    #[test]
    fn test_memory_bound_blocks_cheaper_leaf() {
        let (mut ctx, h, index, mut bounds) = seeded();
        // ITEM hashed on a column NewOrder never routes by.
        bounds
            .plan
            .tables
            .insert("ITEM".into(), PartitionAttribute::column("I_NAME"));
        apply_plan(&mut ctx, &bounds.plan).unwrap();
        bounds.cost = ctx.estimate_cost().unwrap();
        let baseline_memory = ctx.estimate_memory().unwrap();

        let request = request_for(&index, bounds.clone(), &["ITEM"], SearchLimits::default());
        let free = BoundedLocalSearch::new(&index, &h, &request)
            .run(&mut ctx)
            .unwrap();
        assert!(free.improved);
        assert!(free.memory_bytes > baseline_memory);

        bounds.memory_bytes = baseline_memory;
        let request = request_for(&index, bounds, &["ITEM"], SearchLimits::default());
        let bounded = BoundedLocalSearch::new(&index, &h, &request)
            .run(&mut ctx)
            .unwrap();
        assert!(bounded.memory_bytes <= baseline_memory);
        assert_ne!(bounded.plan, free.plan);
        assert_ne!(
            bounded.plan.table("ITEM"),
            Some(&PartitionAttribute::Replicated)
        );
    }

    #[test]
    fn test_upper_bound_memory_zero_is_unbounded() {
        let (_, _, _, mut bounds) = seeded();
        assert!(bounds.admits_memory(u64::MAX));
        bounds.memory_bytes = 100;
        assert!(bounds.admits_memory(100));
        assert!(!bounds.admits_memory(101));
    }

    #[test]
    fn test_branch_and_bound_strategy() {
        let mut ctx = context();
        let mut h = hints();
        let mut seed_ctx = context();
        MostPopular::new()
            .generate(&mut seed_ctx, &mut hints())
            .unwrap();
        let seed_cost = seed_ctx.estimate_cost().unwrap();

        let mut strategy = BranchAndBound::new();
        let plan = strategy.generate(&mut ctx, &mut h).unwrap();
        let outcome = strategy.last_outcome().unwrap();
        assert!(outcome.exhausted);
        assert!(outcome.cost <= seed_cost + 1e-9);
        assert_eq!(plan, PartitionPlan::from_catalog(&ctx.catalog));
    }
}
