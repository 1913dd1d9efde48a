// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Designer hints: search limits, cost weights and feature switches.
//!
//! Hints are read by every strategy and *rewritten* by the LNS search in two
//! places: the entropy weight (auto-tuned from the initial solution) and the
//! start time (shifted on resume so time spent before the checkpoint counts
//! against the global limit).

use crate::PlannerError;
use memory_estimator::MemoryBudget;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Tunables shared by all partitioning strategies.
///
/// All fields have defaults, so a TOML `[hints]` table only needs to name
/// what it overrides:
///
/// ```
/// use partition_planner::DesignerHints;
///
/// let hints: DesignerHints = serde_json::from_str(r#"{ "limit_total_time": 60 }"#).unwrap();
/// assert_eq!(hints.limit_total_time, Some(60));
/// assert!(hints.enable_costmodel_caching);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DesignerHints {
    /// Per-partition memory ceiling in bytes; 0 means unbounded.
    pub max_memory_per_partition: u64,
    /// Backtracks allowed per local search.
    pub limit_back_tracks: Option<u64>,
    /// Seconds allowed per local search.
    pub limit_local_time: Option<u64>,
    /// Seconds allowed for the whole search.
    pub limit_total_time: Option<u64>,
    /// Restart rounds allowed for the whole search.
    pub limit_restarts: Option<u32>,
    pub weight_costmodel_entropy: f64,
    pub weight_costmodel_execution: f64,
    /// Adds composite columns/parameters to the candidate sets.
    pub enable_multi_partitioning: bool,
    /// Invalidate single cache entries instead of clearing the whole cache.
    pub enable_costmodel_caching: bool,
    pub checkpoint_path: Option<PathBuf>,
    pub relaxation_factor_min: f64,
    pub relaxation_factor_max: f64,
    pub relaxation_min_size: usize,
    /// Seed for relaxation choices; entropy-seeded when unset.
    pub random_seed: Option<u64>,
    /// Wall-clock start of the search in epoch milliseconds. Never
    /// serialised; resuming from a checkpoint rewrites it.
    #[serde(skip, default = "now_ms")]
    pub start_time_ms: u64,
}

impl Default for DesignerHints {
    fn default() -> Self {
        Self {
            max_memory_per_partition: 0,
            limit_back_tracks: None,
            limit_local_time: None,
            limit_total_time: None,
            limit_restarts: None,
            weight_costmodel_entropy: 1.0,
            weight_costmodel_execution: 1.0,
            enable_multi_partitioning: false,
            enable_costmodel_caching: true,
            checkpoint_path: None,
            relaxation_factor_min: 0.25,
            relaxation_factor_max: 0.25,
            relaxation_min_size: 5,
            random_seed: None,
            start_time_ms: now_ms(),
        }
    }
}

impl DesignerHints {
    /// Checks that the hints describe a usable search.
    pub fn validate(&self) -> Result<(), PlannerError> {
        for (name, f) in [
            ("relaxation_factor_min", self.relaxation_factor_min),
            ("relaxation_factor_max", self.relaxation_factor_max),
        ] {
            if !(0.0..=1.0).contains(&f) {
                return Err(PlannerError::Config(format!(
                    "{name} must be within [0, 1], got {f}"
                )));
            }
        }
        if self.relaxation_factor_min > self.relaxation_factor_max {
            return Err(PlannerError::Config(format!(
                "relaxation_factor_min ({}) exceeds relaxation_factor_max ({})",
                self.relaxation_factor_min, self.relaxation_factor_max
            )));
        }
        for (name, w) in [
            ("weight_costmodel_entropy", self.weight_costmodel_entropy),
            ("weight_costmodel_execution", self.weight_costmodel_execution),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(PlannerError::Config(format!(
                    "{name} must be finite and non-negative, got {w}"
                )));
            }
        }
        Ok(())
    }

    /// The memory ceiling as a [`MemoryBudget`].
    pub fn memory_budget(&self) -> MemoryBudget {
        MemoryBudget::from_bytes(self.max_memory_per_partition)
    }

    /// Wall-clock start of the search, in epoch milliseconds.
    pub fn start_time(&self) -> u64 {
        self.start_time_ms
    }

    /// Restarts the clock at `ms`.
    pub fn set_start_time(&mut self, ms: u64) {
        self.start_time_ms = ms;
    }

    /// Global deadline in epoch milliseconds, if a total time limit is set.
    pub fn global_stop_time(&self) -> Option<u64> {
        self.limit_total_time
            .map(|secs| self.start_time_ms.saturating_add(secs.saturating_mul(1000)))
    }

    /// Fraction of the global time budget used at `now`, in `[0, 1]`.
    ///
    /// Always 0 without a total time limit.
    pub fn elapsed_global_fraction(&self, now: u64) -> f64 {
        match self.limit_total_time {
            Some(secs) if secs > 0 => {
                let elapsed = now.saturating_sub(self.start_time_ms) as f64;
                (elapsed / (secs as f64 * 1000.0)).clamp(0.0, 1.0)
            }
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    /// Time left before the global deadline.
    pub fn remaining_global_time(&self, now: u64) -> Option<Duration> {
        self.global_stop_time()
            .map(|stop| Duration::from_millis(stop.saturating_sub(now)))
    }

    /// Time limit for one local search: the local limit, reduced to the
    /// remaining global time.
    pub fn local_time_limit(&self, now: u64) -> Option<Duration> {
        let local = self.limit_local_time.map(Duration::from_secs);
        match (local, self.remaining_global_time(now)) {
            (Some(l), Some(g)) => Some(l.min(g)),
            (l, g) => l.or(g),
        }
    }

    /// Shifts the start time so the span `[start_time, last_checkpoint]`
    /// recorded by a previous run is charged to this run's budget.
    pub fn offset_checkpoint_time(&mut self, start_time: Option<u64>, last_checkpoint: Option<u64>) {
        let spent = match (start_time, last_checkpoint) {
            (Some(start), Some(last)) => last.saturating_sub(start),
            _ => 0,
        };
        self.start_time_ms = now_ms().saturating_sub(spent);
        tracing::debug!("charged {spent} ms from the checkpoint to the global time budget");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let h = DesignerHints::default();
        assert!(h.validate().is_ok());
        assert!(h.memory_budget().is_unbounded());
        assert_eq!(h.relaxation_factor_min, h.relaxation_factor_max);
        assert!(h.global_stop_time().is_none());
    }

    #[test]
    fn test_validate_rejects_bad_factors() {
        let h = DesignerHints {
            relaxation_factor_min: 0.6,
            relaxation_factor_max: 0.5,
            ..DesignerHints::default()
        };
        assert!(matches!(h.validate(), Err(PlannerError::Config(_))));
        let h = DesignerHints {
            relaxation_factor_max: 1.5,
            ..DesignerHints::default()
        };
        assert!(h.validate().is_err());
        let h = DesignerHints {
            weight_costmodel_entropy: -1.0,
            ..DesignerHints::default()
        };
        assert!(h.validate().is_err());
    }

    #[test]
    fn test_elapsed_fraction() {
        let mut h = DesignerHints {
            limit_total_time: Some(10),
            ..DesignerHints::default()
        };
        h.set_start_time(1_000);
        assert_eq!(h.elapsed_global_fraction(1_000), 0.0);
        assert!((h.elapsed_global_fraction(6_000) - 0.5).abs() < 1e-12);
        assert_eq!(h.elapsed_global_fraction(50_000), 1.0);
        assert_eq!(h.global_stop_time(), Some(11_000));

        h.limit_total_time = None;
        assert_eq!(h.elapsed_global_fraction(50_000), 0.0);
    }

    #[test]
    fn test_local_time_limit_capped_by_global() {
        let mut h = DesignerHints {
            limit_local_time: Some(30),
            limit_total_time: Some(10),
            ..DesignerHints::default()
        };
        h.set_start_time(0);
        assert_eq!(h.local_time_limit(4_000), Some(Duration::from_secs(6)));
        h.limit_total_time = None;
        assert_eq!(h.local_time_limit(4_000), Some(Duration::from_secs(30)));
        h.limit_local_time = None;
        assert_eq!(h.local_time_limit(4_000), None);
    }

    #[test]
    fn test_offset_checkpoint_time() {
        let mut h = DesignerHints::default();
        let before = now_ms();
        h.offset_checkpoint_time(Some(10_000), Some(25_000));
        assert!(h.start_time() <= before.saturating_sub(15_000) + 1_000);
        assert!(h.start_time() + 15_000 >= before);
    }

    #[test]
    fn test_struct_update_keeps_start_time() {
        let base = DesignerHints {
            start_time_ms: 42_000,
            ..DesignerHints::default()
        };
        let h = DesignerHints {
            limit_restarts: Some(3),
            ..base.clone()
        };
        assert_eq!(h.start_time(), 42_000);
        assert_eq!(h, DesignerHints { limit_restarts: Some(3), ..base });
    }

    #[test]
    fn test_partial_toml_like_input() {
        let h: DesignerHints =
            serde_json::from_str(r#"{ "max_memory_per_partition": 1024, "random_seed": 3 }"#)
                .unwrap();
        assert_eq!(h.max_memory_per_partition, 1024);
        assert_eq!(h.random_seed, Some(3));
        assert_eq!(h.relaxation_min_size, 5);
    }
}
