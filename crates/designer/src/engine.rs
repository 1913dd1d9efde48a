// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The designer with a type-state enforced pipeline.
//!
//! ```text
//! Designer<Idle>
//!     │  .load_inputs()      catalog, workload, correlations, cost model
//!     ▼
//! Designer<Loaded>
//!     │  .run() / .run_blocking()
//!     ▼
//!   DesignOutput
//! ```
//!
//! Each state transition consumes the old value and returns a new one,
//! making invalid state sequences a compile error. The search itself is
//! CPU-bound and single-threaded; [`Designer::run`] moves it onto tokio's
//! blocking pool so an async caller is never stalled.

use crate::{DesignMetrics, DesignerConfig, DesignerError};
use catalog_model::catalog::Validated;
use catalog_model::{Catalog, CatalogLoader, ParameterCorrelations};
use cost_model::Workload;
use memory_estimator::TableSizeEstimator;
use partition_planner::mutators::apply_plan;
use partition_planner::{DesignContext, DesignerHints, PartitionPlan};
use std::path::Path;
use std::time::Instant;

// ── Type-state markers ─────────────────────────────────────────

/// Designer is configured but nothing is loaded.
#[derive(Debug)]
pub struct Idle;

/// Inputs are loaded and the design context is built.
#[derive(Debug)]
pub struct Loaded {
    context: DesignContext,
    hints: DesignerHints,
}

/// Sealed trait for designer states.
pub trait DesignerState: std::fmt::Debug {}
impl DesignerState for Idle {}
impl DesignerState for Loaded {}

// ── Design output ──────────────────────────────────────────────

/// The result of a design run.
#[derive(Debug)]
pub struct DesignOutput {
    /// The chosen plan.
    pub plan: PartitionPlan,
    pub metrics: DesignMetrics,
    /// The catalog with the plan applied and single-partition flags set.
    pub catalog: Catalog<Validated>,
    /// Hints as the strategy left them (auto-tuned entropy weight included).
    pub hints: DesignerHints,
}

impl DesignOutput {
    /// The plan as pretty-printed JSON.
    pub fn plan_json(&self) -> Result<String, DesignerError> {
        serde_json::to_string_pretty(&self.plan)
            .map_err(|e| DesignerError::ConfigError(format!("cannot serialise plan: {e}")))
    }

    /// Writes the plan as JSON to `path`.
    pub fn write_plan(&self, path: &Path) -> Result<(), DesignerError> {
        let json = self.plan_json()?;
        std::fs::write(path, json).map_err(|source| DesignerError::OutputError {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!("plan written to '{}'", path.display());
        Ok(())
    }
}

// ── Designer ───────────────────────────────────────────────────

/// The primary design driver.
///
/// `S` is a type-state marker: `.run()` only exists once inputs are
/// loaded.
///
/// # Example
/// ```no_run
/// use designer::{Designer, DesignerConfig};
///
/// # async fn example() -> Result<(), designer::DesignerError> {
/// let config = DesignerConfig::from_file(std::path::Path::new("designer.toml"))?;
/// let output = Designer::new(config).load_inputs()?.run().await?;
/// println!("{}", output.metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct Designer<S: DesignerState = Idle> {
    config: DesignerConfig,
    state: S,
}

// ── Idle → Loaded ──────────────────────────────────────────────

impl Designer<Idle> {
    /// Creates a new designer from the given configuration.
    pub fn new(config: DesignerConfig) -> Self {
        tracing::info!("designer created with strategy '{}'", config.strategy);
        Self {
            config,
            state: Idle,
        }
    }

    /// Loads catalog, workload and correlations and builds the context.
    /// Transitions to the `Loaded` state.
    ///
    /// Steps:
    /// 1. Resolve and validate the hints (budget, checkpoint path).
    /// 2. Load and validate the catalog.
    /// 3. Load the workload trace.
    /// 4. Build the cost model and memory estimator.
    /// 5. Load correlations, if configured.
    pub fn load_inputs(self) -> Result<Designer<Loaded>, DesignerError> {
        let hints = self.config.resolve_hints()?;
        tracing::info!("memory budget: {}", hints.memory_budget());

        let catalog = CatalogLoader::load(&self.config.catalog_path)?;
        tracing::info!("{}", catalog.summary());
        let workload = Workload::from_file(&self.config.workload_path)?;

        let cost_model = self.config.create_cost_model(&hints)?;
        let mut context = DesignContext::new(
            catalog,
            workload,
            cost_model,
            Box::new(TableSizeEstimator::new()),
        );
        if let Some(path) = &self.config.correlations_path {
            let correlations = ParameterCorrelations::load(path, &context.catalog)?;
            context = context
                .with_correlations(correlations)
                .with_correlations_path(path.clone());
        }

        Ok(Self::from_context(self.config, context, hints))
    }

    /// Convenience: wraps a pre-built context (for testing).
    pub fn from_context(
        config: DesignerConfig,
        context: DesignContext,
        hints: DesignerHints,
    ) -> Designer<Loaded> {
        Designer {
            config,
            state: Loaded { context, hints },
        }
    }
}

// ── Loaded: run the design ─────────────────────────────────────

impl Designer<Loaded> {
    /// Returns the design context.
    pub fn context(&self) -> &DesignContext {
        &self.state.context
    }

    /// Returns the resolved hints.
    pub fn hints(&self) -> &DesignerHints {
        &self.state.hints
    }

    /// Runs the configured strategy on the blocking thread pool.
    pub async fn run(self) -> Result<DesignOutput, DesignerError> {
        tokio::task::spawn_blocking(move || self.run_blocking())
            .await
            .map_err(|e| DesignerError::TaskError(format!("join error: {e}")))?
    }

    /// Runs the configured strategy on the current thread.
    ///
    /// Steps:
    /// 1. Snapshot the catalog's current assignment as the baseline.
    /// 2. Generate a plan with the configured strategy.
    /// 3. Price the plan and the baseline under the final weights.
    /// 4. Write the plan if an output path is configured.
    pub fn run_blocking(self) -> Result<DesignOutput, DesignerError> {
        let run_start = Instant::now();
        let Loaded {
            mut context,
            mut hints,
        } = self.state;

        let mut strategy = self.config.create_strategy()?;
        tracing::info!("using strategy: {}", strategy.name());
        let baseline = PartitionPlan::from_catalog(&context.catalog);

        let plan = strategy.generate(&mut context, &mut hints)?;

        // Weights may have been re-tuned during the search, so the
        // baseline is priced again afterwards.
        apply_plan(&mut context, &baseline)?;
        let baseline_cost = context.estimate_cost()?;
        apply_plan(&mut context, &plan)?;
        context.cost_model.clear(true);
        let final_cost = context.estimate_cost()?;
        let memory_bytes = context.estimate_memory()?;

        let mut metrics = DesignMetrics::new(strategy.name(), baseline_cost);
        metrics.record_rounds(strategy.rounds());
        metrics.finalise(
            run_start.elapsed(),
            final_cost,
            memory_bytes,
            hints.max_memory_per_partition,
        );
        tracing::info!("{}", metrics.summary());
        tracing::info!("{}", plan.summary());

        let output = DesignOutput {
            plan,
            metrics,
            catalog: context.catalog,
            hints,
        };
        if let Some(path) = &self.config.output_path {
            output.write_plan(path)?;
        }
        Ok(output)
    }
}

impl<S: DesignerState> std::fmt::Debug for Designer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Designer")
            .field("state", &std::any::type_name::<S>())
            .field("strategy", &self.config.strategy)
            .field("catalog_path", &self.config.catalog_path)
            .finish()
    }
}
