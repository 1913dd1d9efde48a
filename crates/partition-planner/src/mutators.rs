// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Assignment mutators.
//!
//! Every write a strategy makes to the catalog goes through here, so the
//! cost model's cache is always told what changed. With caching enabled
//! only the touched entry is dropped; otherwise the whole cache is cleared.

use crate::ranking::best_parameter;
use crate::{DesignContext, DesignerHints, PartitionPlan, PlannerError, SearchIndex};
use catalog_model::{PartitionAttribute, PartitionParameter};

/// Sets `table`'s attribute and replicated flag. Returns the previous
/// attribute.
pub fn apply_column_swap(
    ctx: &mut DesignContext,
    hints: &DesignerHints,
    table: &str,
    attribute: PartitionAttribute,
) -> Result<PartitionAttribute, PlannerError> {
    let previous = ctx.catalog.set_partition_attribute(table, attribute)?;
    if hints.enable_costmodel_caching {
        ctx.cost_model.invalidate_table(table);
    } else {
        ctx.cost_model.clear(false);
    }
    Ok(previous)
}

/// Sets `procedure`'s parameter if it differs from the current one.
/// Returns `true` if the catalog changed.
pub fn apply_parameter_swap(
    ctx: &mut DesignContext,
    hints: &DesignerHints,
    procedure: &str,
    parameter: PartitionParameter,
) -> Result<bool, PlannerError> {
    let unchanged = ctx
        .catalog
        .procedure(procedure)
        .is_some_and(|p| p.partition_parameter == parameter);
    if unchanged {
        return Ok(false);
    }
    ctx.catalog.set_partition_parameter(procedure, parameter)?;
    if hints.enable_costmodel_caching {
        ctx.cost_model.invalidate_procedure(procedure);
    } else {
        ctx.cost_model.clear(false);
    }
    Ok(true)
}

/// Applies a batch of parameter swaps. Returns how many changed.
pub fn apply_parameter_swaps<I>(
    ctx: &mut DesignContext,
    hints: &DesignerHints,
    swaps: I,
) -> Result<usize, PlannerError>
where
    I: IntoIterator<Item = (String, PartitionParameter)>,
{
    let mut changed = 0;
    for (procedure, parameter) in swaps {
        if apply_parameter_swap(ctx, hints, &procedure, parameter)? {
            changed += 1;
        }
    }
    Ok(changed)
}

/// Re-ranks `procedures` under the current table attributes and applies
/// the winners. Procedures outside the candidate universe are skipped.
pub fn recalculate_parameters<'a, I>(
    ctx: &mut DesignContext,
    hints: &DesignerHints,
    index: &SearchIndex,
    procedures: I,
) -> Result<usize, PlannerError>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut swaps = Vec::new();
    for procedure in procedures {
        if !index.is_candidate_procedure(procedure) {
            continue;
        }
        swaps.push((procedure.clone(), best_parameter(ctx, index, procedure)?));
    }
    apply_parameter_swaps(ctx, hints, swaps)
}

/// Writes a whole plan into the catalog and drops cached costs.
pub fn apply_plan(ctx: &mut DesignContext, plan: &PartitionPlan) -> Result<(), PlannerError> {
    plan.apply(&mut ctx.catalog)?;
    ctx.cost_model.clear(false);
    Ok(())
}

/// Marks each non-system procedure single-partitioned iff it has a
/// partitioning parameter.
pub fn annotate_single_partition(ctx: &mut DesignContext) -> Result<usize, PlannerError> {
    let flags: Vec<(String, bool)> = ctx
        .catalog
        .procedures()
        .filter(|p| !p.system)
        .map(|p| (p.name.clone(), !p.partition_parameter.is_null()))
        .collect();
    let mut single = 0;
    for (name, flag) in flags {
        ctx.catalog.set_single_partition(&name, flag)?;
        single += usize::from(flag);
    }
    Ok(single)
}
