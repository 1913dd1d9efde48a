// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared helpers.

pub mod benchmark;
pub mod checkpoint;
pub mod inspect;
pub mod optimize;

use designer::DesignerConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Input files shared by `optimize` and `benchmark`.
#[derive(Debug, clap::Args)]
pub struct InputArgs {
    /// Path to the JSON catalog manifest.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Path to the JSON workload trace.
    #[arg(short, long)]
    pub workload: Option<PathBuf>,

    /// Path to the JSON parameter correlations.
    #[arg(long)]
    pub correlations: Option<PathBuf>,
}

/// Loads `config_file` if given, then lays `inputs` over it.
///
/// Without a config file both `--catalog` and `--workload` are required.
pub fn base_config(
    config_file: Option<PathBuf>,
    inputs: InputArgs,
) -> anyhow::Result<DesignerConfig> {
    let mut config = match &config_file {
        Some(path) => DesignerConfig::from_file(path)?,
        None => {
            let (Some(_), Some(_)) = (&inputs.catalog, &inputs.workload) else {
                anyhow::bail!("--catalog and --workload are required without --config");
            };
            DesignerConfig::default()
        }
    };
    if let Some(catalog) = inputs.catalog {
        config.catalog_path = catalog;
    }
    if let Some(workload) = inputs.workload {
        config.workload_path = workload;
    }
    if inputs.correlations.is_some() {
        config.correlations_path = inputs.correlations;
    }
    Ok(config)
}

/// Formats a byte count as KB/MB.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

/// Truncates a string with ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
