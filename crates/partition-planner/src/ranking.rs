// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Correlation-based procedure-parameter ranking.
//!
//! For every partitioned table whose routing column appears in a
//! procedure's access histogram, each scalar parameter is weighted by
//! `coefficient × access_count` for each of its correlations with that
//! column. A parameter's score is the zero-safe geometric mean of its
//! weights; the highest score wins, ties going to the lower index.

use crate::{DesignContext, PlannerError, SearchIndex};
use catalog_model::{CatalogError, ColumnRef, PartitionParameter};
use std::collections::BTreeMap;

/// Geometric mean over the strictly positive values.
///
/// Non-positive terms are left out instead of collapsing the product; an
/// input with no positive term has mean 0.
pub fn geometric_mean_zero_safe(values: &[f64]) -> f64 {
    let logs: Vec<f64> = values.iter().filter(|v| **v > 0.0).map(|v| v.ln()).collect();
    if logs.is_empty() {
        return 0.0;
    }
    (logs.iter().sum::<f64>() / logs.len() as f64).exp()
}

/// Scores every scalar parameter of `procedure` that has at least one
/// correlation weight, best first.
pub fn rank_parameters(
    ctx: &DesignContext,
    index: &SearchIndex,
    procedure: &str,
) -> Result<Vec<(usize, f64)>, PlannerError> {
    let proc = ctx
        .catalog
        .procedure(procedure)
        .ok_or_else(|| CatalogError::UnknownProcedure(procedure.to_string()))?;
    let Some(histogram) = index.histogram(procedure) else {
        return Ok(Vec::new());
    };

    let mut weights: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for table in ctx.catalog.tables() {
        if table.is_replicated {
            continue;
        }
        for column in table.partition.columns() {
            let Some(&count) = histogram.get(&ColumnRef::new(&table.name, column)) else {
                continue;
            };
            for param in proc.scalar_parameters() {
                let list = weights.entry(param.index).or_default();
                list.extend(
                    ctx.correlations
                        .coefficients(procedure, param.index, &table.name, column)
                        .map(|c| c.coefficient * count as f64),
                );
            }
        }
    }

    let mut ranked: Vec<(usize, f64)> = weights
        .into_iter()
        .filter(|(_, w)| !w.is_empty())
        .map(|(i, w)| (i, geometric_mean_zero_safe(&w)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    Ok(ranked)
}

/// The best partitioning parameter for `procedure`.
///
/// Falls back to the first declared scalar parameter when the procedure
/// was never traced or no correlation links its parameters to a routing
/// column, and to `Null` when it has no scalar parameter at all.
pub fn best_parameter(
    ctx: &DesignContext,
    index: &SearchIndex,
    procedure: &str,
) -> Result<PartitionParameter, PlannerError> {
    let proc = ctx
        .catalog
        .procedure(procedure)
        .ok_or_else(|| CatalogError::UnknownProcedure(procedure.to_string()))?;
    let default = proc
        .scalar_parameters()
        .next()
        .map(|p| PartitionParameter::Parameter(p.index))
        .unwrap_or(PartitionParameter::Null);

    if index.histogram(procedure).is_none() {
        tracing::warn!("no column access histogram for {procedure}, using {default}");
        return Ok(default);
    }
    let ranked = rank_parameters(ctx, index, procedure)?;
    match ranked.first() {
        Some(&(best, score)) => {
            tracing::debug!("{procedure}: best parameter #{best} (score {score:.3}) of {ranked:?}");
            Ok(PartitionParameter::Parameter(best))
        }
        None => {
            tracing::warn!(
                "no parameter of {procedure} correlates with a partitioning column, using {default}"
            );
            Ok(default)
        }
    }
}
