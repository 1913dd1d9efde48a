// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Checkpointable search state.
//!
//! The LNS loop persists a [`SearchState`] after every completed round so a
//! killed run can resume from its last round. The file is JSON, written to
//! a sibling temp file, fsynced and renamed over the target: a reader sees
//! either the previous checkpoint or the new one, never a torn write.

use crate::{PartitionPlan, PlannerError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Everything needed to resume an LNS run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchState {
    pub initial_solution: Option<PartitionPlan>,
    pub initial_cost: f64,
    /// Memory of the initial solution as a fraction of the budget.
    pub initial_memory: f64,
    pub best_solution: Option<PartitionPlan>,
    pub best_cost: f64,
    /// Memory of the best solution as a fraction of the budget.
    pub best_memory: f64,
    pub last_relax_size: usize,
    pub last_exhausted_search: bool,
    pub restart_counter: u32,
    /// Epoch milliseconds.
    pub start_time: Option<u64>,
    /// Epoch milliseconds.
    pub last_checkpoint: Option<u64>,
    /// Entropy weight after auto-tuning, so a resumed run prices plans the
    /// same way.
    pub entropy_weight: Option<f64>,
}

impl SearchState {
    /// Returns `true` if the state came from a previous run.
    pub fn is_resumed(&self) -> bool {
        self.start_time.is_some() || self.last_checkpoint.is_some()
    }

    /// Atomically writes the state to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PlannerError> {
        let io_err = |source: std::io::Error| PlannerError::Checkpoint {
            path: path.display().to_string(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|source| {
            PlannerError::CheckpointFormat {
                path: path.display().to_string(),
                source,
            }
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = temp_path(path);
        let mut file = File::create(&tmp).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    /// Reads a state previously written by [`SearchState::save`].
    pub fn load(path: &Path) -> Result<Self, PlannerError> {
        let content = fs::read_to_string(path).map_err(|source| PlannerError::Checkpoint {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| PlannerError::CheckpointFormat {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads the state if `path` exists.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>, PlannerError> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
