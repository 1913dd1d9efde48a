// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Large-neighborhood search.
//!
//! Starts from the most-popular plan and repeats:
//!
//! ```text
//! relax    pick `size` random tables; free them and every procedure
//!          that references them
//! search   bounded branch-and-bound over the freed neighborhood,
//!          everything else pinned to the best plan
//! accept   iff the exact cost is strictly lower than the best cost
//! persist  write the SearchState checkpoint
//! ```
//!
//! The relaxation size grows with the fraction of the global time budget
//! already spent and never shrinks. The search ends at the global
//! deadline, at the restart limit, or once a search over all tables has
//! been exhausted.

use crate::checkpoint::SearchState;
use crate::mutators::{annotate_single_partition, apply_plan};
use crate::strategy::branch_and_bound::{
    BoundedLocalSearch, LocalSearchOutcome, LocalSearchRequest, SearchLimits, UpperBounds,
};
use crate::strategy::greedy::seed_plan;
use crate::strategy::{PartitionStrategy, RoundReport};
use crate::{now_ms, DesignContext, DesignerHints, PartitionPlan, PlannerError, SearchIndex};
use catalog_model::{PartitionAttribute, PartitionParameter};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Relative tolerance when re-estimating the best cost.
const COST_TOLERANCE: f64 = 1e-6;

/// How many tables a round relaxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationPolicy {
    pub factor_min: f64,
    pub factor_max: f64,
    pub min_size: usize,
}

impl RelaxationPolicy {
    pub fn from_hints(hints: &DesignerHints) -> Self {
        Self {
            factor_min: hints.relaxation_factor_min,
            factor_max: hints.relaxation_factor_max,
            min_size: hints.relaxation_min_size,
        }
    }

    /// `(relax_min, relax_max)` for a catalog of `num_tables` tables.
    pub fn bounds(&self, num_tables: usize) -> (usize, usize) {
        let n = num_tables as f64;
        let min = ((self.factor_min * n).round() as usize).max(1);
        let max = ((self.factor_max * n).round() as usize).max(self.min_size);
        (min, max)
    }

    /// Relaxation size after `elapsed` of the time budget, given the size
    /// of the previous round.
    pub fn relax_size(&self, num_tables: usize, last: usize, elapsed: f64) -> usize {
        let (min, max) = self.bounds(num_tables);
        let lerp = ((max as f64 - min as f64) * elapsed + min as f64)
            .round()
            .max(0.0) as usize;
        lerp.max(last).max(min).min(num_tables)
    }
}

/// The freed part of the catalog for one round.
#[derive(Debug)]
struct Neighborhood {
    tables: Vec<(String, Vec<PartitionAttribute>)>,
    procedures: Vec<(String, Vec<PartitionParameter>)>,
    /// Memory of the pinned tables as a fraction of the budget.
    nonrelaxed_memory: f64,
}

/// Checkpointed large-neighborhood search.
#[derive(Debug, Default)]
pub struct LnsPartitioner {
    state: SearchState,
    rounds: Vec<RoundReport>,
}

impl LnsPartitioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of the last run, as it would be checkpointed.
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    fn best_plan(&self) -> Result<PartitionPlan, PlannerError> {
        self.state
            .best_solution
            .clone()
            .ok_or_else(|| PlannerError::InvariantViolation("no best solution recorded".into()))
    }

    /// Seeds the search and records the initial solution as the best one.
    fn initialize(
        &mut self,
        ctx: &mut DesignContext,
        hints: &mut DesignerHints,
        index: &SearchIndex,
    ) -> Result<(), PlannerError> {
        let budget = hints.memory_budget();
        let initial = seed_plan(ctx, hints, index)?;
        apply_plan(ctx, &initial)?;
        let memory = budget.ratio(ctx.estimate_memory()?);
        let mut cost = ctx.estimate_cost()?;

        let partitions = ctx.num_partitions();
        let untouched = ctx.cost_model.untouched_partitions(partitions);
        if !untouched.is_empty() {
            let weight =
                hints.weight_costmodel_entropy * f64::from(partitions) / untouched.len() as f64;
            info!(
                "{} of {partitions} partitions untouched by the initial solution, entropy weight {:.3} → {weight:.3}",
                untouched.len(),
                hints.weight_costmodel_entropy,
            );
            hints.weight_costmodel_entropy = weight;
            ctx.cost_model.set_entropy_weight(weight);
            ctx.cost_model.clear(false);
            cost = ctx.estimate_cost()?;
        }

        info!(
            "initial solution: cost {cost:.6}, memory {:.1}% of {budget}",
            memory * 100.0
        );
        self.state.initial_solution = Some(initial.clone());
        self.state.initial_cost = cost;
        self.state.initial_memory = memory;
        self.state.best_solution = Some(initial);
        self.state.best_cost = cost;
        self.state.best_memory = memory;
        self.state.entropy_weight = Some(hints.weight_costmodel_entropy);
        Ok(())
    }

    /// Picks the next neighborhood, or `None` once the whole catalog has
    /// been searched exhaustively.
    fn relax(
        &mut self,
        ctx: &mut DesignContext,
        hints: &DesignerHints,
        index: &SearchIndex,
        policy: &RelaxationPolicy,
        rng: &mut StdRng,
    ) -> Result<Option<Neighborhood>, PlannerError> {
        let num_tables = index.num_tables();
        if self.state.last_relax_size == num_tables && self.state.last_exhausted_search {
            return Ok(None);
        }

        let elapsed = hints.elapsed_global_fraction(now_ms());
        let (relax_min, _) = policy.bounds(num_tables);
        let size = policy.relax_size(num_tables, self.state.last_relax_size, elapsed);
        if size == 0 || size < relax_min || size > num_tables {
            return Err(PlannerError::InvariantViolation(format!(
                "relax size {size} outside [{relax_min}, {num_tables}]"
            )));
        }
        info!(
            "LNS RESTART #{:03} [relax_size={size}] last_relax_size={} last_exhausted={} elapsed_ratio={elapsed:.2}",
            self.state.restart_counter,
            self.state.last_relax_size,
            self.state.last_exhausted_search,
        );

        let best = self.best_plan()?;
        apply_plan(ctx, &best)?;

        let mut picks = rand::seq::index::sample(rng, num_tables, size).into_vec();
        picks.sort_unstable();
        let mut relaxed: Vec<String> = picks
            .into_iter()
            .map(|i| index.tables()[i].clone())
            .collect();
        relaxed.shuffle(rng);
        for table in &relaxed {
            ctx.cost_model.invalidate_table(table);
        }

        let pinned: Vec<String> = index
            .tables()
            .iter()
            .filter(|t| !relaxed.contains(t))
            .cloned()
            .collect();
        let nonrelaxed_memory = hints.memory_budget().ratio(ctx.estimate_memory_of(&pinned)?);
        if !(0.0..1.0).contains(&nonrelaxed_memory) {
            return Err(PlannerError::InvariantViolation(format!(
                "non-relaxed tables use {:.1}% of the memory budget",
                nonrelaxed_memory * 100.0
            )));
        }

        let tables: Vec<(String, Vec<PartitionAttribute>)> = relaxed
            .iter()
            .map(|t| {
                let mut candidates = index.candidates(t).to_vec();
                candidates.shuffle(rng);
                (t.clone(), candidates)
            })
            .collect();
        let referencing: BTreeSet<String> = relaxed
            .iter()
            .flat_map(|t| index.table_procedures(t).cloned())
            .collect();
        let procedures: Vec<(String, Vec<PartitionParameter>)> = referencing
            .into_iter()
            .map(|p| {
                let candidates = index
                    .parameter_candidates(&p)
                    .iter()
                    .filter(|c| !c.is_null())
                    .cloned()
                    .collect();
                (p, candidates)
            })
            .collect();
        debug!(
            "relaxed {relaxed:?} with {} procedures, pinned tables use {:.1}% of memory",
            procedures.len(),
            nonrelaxed_memory * 100.0
        );

        self.state.last_exhausted_search = false;
        self.state.last_relax_size = size;
        Ok(Some(Neighborhood {
            tables,
            procedures,
            nonrelaxed_memory,
        }))
    }

    /// Runs the bounded search over `hood` and checks that nothing outside
    /// it moved.
    fn local_search(
        &self,
        ctx: &mut DesignContext,
        hints: &DesignerHints,
        index: &SearchIndex,
        hood: Neighborhood,
    ) -> Result<LocalSearchOutcome, PlannerError> {
        let best = self.best_plan()?;
        let budget = hints.memory_budget();
        let max_memory = budget.as_bytes() as f64;
        let request = LocalSearchRequest {
            tables: hood.tables,
            procedures: hood.procedures,
            bounds: UpperBounds {
                plan: best.clone(),
                cost: self.state.best_cost,
                memory_bytes: (self.state.best_memory * max_memory).round() as u64,
            },
            memory_budget: (!budget.is_unbounded())
                .then(|| ((1.0 - hood.nonrelaxed_memory) * max_memory).floor() as u64),
            limits: SearchLimits {
                back_tracks: hints.limit_back_tracks,
                time: hints.local_time_limit(now_ms()),
            },
        };
        let outcome = BoundedLocalSearch::new(index, hints, &request).run(ctx)?;

        let free_tables: BTreeSet<&str> = request.tables.iter().map(|(t, _)| t.as_str()).collect();
        let free_procedures: BTreeSet<&str> =
            request.procedures.iter().map(|(p, _)| p.as_str()).collect();
        check_pinned(&best, &outcome.plan, &free_tables, &free_procedures)?;
        Ok(outcome)
    }

    /// Re-applies the best plan and checks its cost on a cold cache.
    fn verify_best(&self, ctx: &mut DesignContext) -> Result<(), PlannerError> {
        let best = self.best_plan()?;
        apply_plan(ctx, &best)?;
        ctx.cost_model.clear(true);
        let cost = ctx.estimate_cost()?;
        let expected = self.state.best_cost;
        if (cost - expected).abs() > COST_TOLERANCE * expected.abs().max(1.0) {
            return Err(PlannerError::InvariantViolation(format!(
                "best solution re-estimates to {cost} instead of {expected}"
            )));
        }
        Ok(())
    }

    fn finish(&self, ctx: &mut DesignContext) -> Result<PartitionPlan, PlannerError> {
        let state = &self.state;
        if state.best_cost > state.initial_cost + COST_TOLERANCE * state.initial_cost.abs().max(1.0)
        {
            return Err(PlannerError::InvariantViolation(format!(
                "best cost {} exceeds initial cost {}",
                state.best_cost, state.initial_cost
            )));
        }
        let best = self.best_plan()?;
        apply_plan(ctx, &best)?;
        annotate_single_partition(ctx)?;
        info!(
            "LNS finished after {} restarts: cost {:.6} → {:.6}",
            state.restart_counter, state.initial_cost, state.best_cost
        );
        Ok(best)
    }
}

/// Fails if `outcome` differs from `pinned` outside the free tables and
/// procedures.
fn check_pinned(
    pinned: &PartitionPlan,
    outcome: &PartitionPlan,
    free_tables: &BTreeSet<&str>,
    free_procedures: &BTreeSet<&str>,
) -> Result<(), PlannerError> {
    for (table, attr) in &pinned.tables {
        if !free_tables.contains(table.as_str()) && outcome.table(table) != Some(attr) {
            return Err(PlannerError::InvariantViolation(format!(
                "pinned table {table} changed from {attr} during local search"
            )));
        }
    }
    for (procedure, param) in &pinned.procedures {
        if !free_procedures.contains(procedure.as_str())
            && outcome.procedure(procedure) != Some(param)
        {
            return Err(PlannerError::InvariantViolation(format!(
                "pinned procedure {procedure} changed from {param} during local search"
            )));
        }
    }
    Ok(())
}

impl PartitionStrategy for LnsPartitioner {
    fn name(&self) -> &str {
        "lns"
    }

    fn generate(
        &mut self,
        ctx: &mut DesignContext,
        hints: &mut DesignerHints,
    ) -> Result<PartitionPlan, PlannerError> {
        hints.validate()?;
        self.rounds.clear();
        let policy = RelaxationPolicy::from_hints(hints);
        ctx.cost_model.set_entropy_weight(hints.weight_costmodel_entropy);
        ctx.reload_correlations()?;
        let index = SearchIndex::build(&ctx.catalog, &ctx.workload, hints)?;
        let num_tables = index.num_tables();

        let (relax_min, _) = policy.bounds(num_tables);
        if hints.limit_total_time.is_none() && hints.limit_restarts.is_none() {
            if relax_min < num_tables {
                return Err(PlannerError::Config(format!(
                    "neither limit_total_time nor limit_restarts is set; relaxing {relax_min} of {num_tables} tables would never terminate"
                )));
            }
            // A halted search is never exhausted, so the full relaxation
            // would repeat forever.
            if num_tables > 0
                && (hints.limit_back_tracks.is_some() || hints.limit_local_time.is_some())
            {
                return Err(PlannerError::Config(
                    "neither limit_total_time nor limit_restarts is set; limit_back_tracks or limit_local_time may halt every round before it is exhausted".to_string(),
                ));
            }
        }

        let checkpoint = hints.checkpoint_path.clone();
        let resumed = match &checkpoint {
            Some(path) => SearchState::load_if_exists(path)?,
            None => None,
        };
        match resumed {
            Some(state) if state.best_solution.is_some() => {
                info!(
                    "resuming from {} at restart #{} (best cost {:.6})",
                    checkpoint
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    state.restart_counter,
                    state.best_cost
                );
                hints.offset_checkpoint_time(state.start_time, state.last_checkpoint);
                if let Some(weight) = state.entropy_weight {
                    hints.weight_costmodel_entropy = weight;
                    ctx.cost_model.set_entropy_weight(weight);
                }
                self.state = state;
                self.state.start_time = Some(hints.start_time());
            }
            other => {
                if other.is_some() {
                    warn!("checkpoint holds no best solution, starting over");
                }
                self.state = SearchState {
                    start_time: Some(hints.start_time()),
                    ..SearchState::default()
                };
                self.initialize(ctx, hints, &index)?;
            }
        }

        if num_tables == 0 {
            return self.finish(ctx);
        }
        ctx.cost_model.clear(true);

        let mut rng = match hints.random_seed {
            Some(seed) => {
                StdRng::seed_from_u64(seed.wrapping_add(u64::from(self.state.restart_counter)))
            }
            None => StdRng::from_entropy(),
        };
        let budget = hints.memory_budget();

        loop {
            let round_start = Instant::now();
            let restart = self.state.restart_counter;
            let Some(hood) = self.relax(ctx, hints, &index, &policy, &mut rng)? else {
                info!("search space exhausted after {restart} restarts");
                break;
            };
            let relax_size = self.state.last_relax_size;
            let relaxed_tables: Vec<String> = hood.tables.iter().map(|(t, _)| t.clone()).collect();

            let outcome = self.local_search(ctx, hints, &index, hood)?;
            let accepted = outcome.cost < self.state.best_cost;
            if accepted {
                info!(
                    "restart #{restart:03}: new best cost {:.6} (was {:.6})",
                    outcome.cost, self.state.best_cost
                );
                self.state.best_solution = Some(outcome.plan.clone());
                self.state.best_cost = outcome.cost;
                self.state.best_memory = budget.ratio(outcome.memory_bytes);
            }
            self.state.last_exhausted_search = outcome.exhausted;
            self.verify_best(ctx)?;

            self.rounds.push(RoundReport {
                restart,
                relax_size,
                relaxed_tables,
                cost: outcome.cost,
                best_cost: self.state.best_cost,
                accepted,
                exhausted: outcome.exhausted,
                nodes: outcome.nodes,
                back_tracks: outcome.back_tracks,
                duration: round_start.elapsed(),
            });
            self.state.restart_counter += 1;

            let now = now_ms();
            self.state.last_checkpoint = Some(now);
            if hints.global_stop_time().is_some_and(|stop| now >= stop) {
                info!("global time limit reached after {} restarts", self.state.restart_counter);
                break;
            }
            if hints
                .limit_restarts
                .is_some_and(|max| self.state.restart_counter >= max)
            {
                info!("restart limit of {} reached", self.state.restart_counter);
                break;
            }
            if let Some(path) = &checkpoint {
                self.state.save(path)?;
                info!("checkpoint written to {}", path.display());
            }
        }

        self.finish(ctx)
    }

    fn rounds(&self) -> &[RoundReport] {
        &self.rounds
    }
}
