// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: end-to-end design pipeline.
//!
//! These tests exercise the complete flow from files on disk → config →
//! loading → search → plan file, proving that the crates compose correctly
//! and that the type-state transitions work end-to-end.

use catalog_model::PartitionAttribute;
use cost_model::{ParamValue, QueryTrace, TransactionTrace, Workload};
use designer::{Designer, DesignerConfig, DesignerError};
use partition_planner::{PartitionPlan, PlannerError, SearchState};
use std::path::Path;

// ── Helpers ────────────────────────────────────────────────────

const CATALOG: &str = r#"{
  "name": "retail",
  "num_partitions": 4,
  "tables": [
    { "name": "WAREHOUSE", "columns": ["W_ID", "W_NAME"],
      "stats": { "tuple_count": 4,  "tuple_size_total": 2000 } },
    { "name": "STOCK",     "columns": ["S_I_ID", "S_W_ID", "S_QTY"],
      "stats": { "tuple_count": 40, "tuple_size_total": 40000 } },
    { "name": "ORDERS",    "columns": ["O_ID", "O_W_ID", "O_C_ID"],
      "stats": { "tuple_count": 32, "tuple_size_total": 32000 } },
    { "name": "ITEM",      "columns": ["I_ID", "I_NAME"],
      "stats": { "tuple_count": 10, "tuple_size_total": 8000 } }
  ],
  "procedures": [
    { "name": "NewOrder",
      "parameters": [{ "name": "w_id" }, { "name": "o_id" }, { "name": "i_id" }],
      "columns": ["WAREHOUSE.W_ID", "STOCK.S_W_ID", "STOCK.S_I_ID",
                  "ORDERS.O_W_ID", "ORDERS.O_ID", "ITEM.I_ID"] },
    { "name": "StockLevel",
      "parameters": [{ "name": "w_id" }],
      "columns": ["STOCK.S_W_ID"] },
    { "name": "GetItem",
      "parameters": [{ "name": "i_id" }],
      "columns": ["ITEM.I_ID"] }
  ]
}"#;

const CORRELATIONS: &str = r#"[
  { "procedure": "NewOrder", "parameter": 0, "table": "WAREHOUSE", "column": "W_ID", "coefficient": 1.0 },
  { "procedure": "NewOrder", "parameter": 0, "table": "STOCK", "column": "S_W_ID", "coefficient": 1.0 },
  { "procedure": "NewOrder", "parameter": 0, "table": "ORDERS", "column": "O_W_ID", "coefficient": 1.0 },
  { "procedure": "NewOrder", "parameter": 1, "table": "ORDERS", "column": "O_ID", "coefficient": 1.0 },
  { "procedure": "NewOrder", "parameter": 2, "table": "ITEM", "column": "I_ID", "coefficient": 1.0 },
  { "procedure": "NewOrder", "parameter": 2, "table": "STOCK", "column": "S_I_ID", "coefficient": 1.0 },
  { "procedure": "StockLevel", "parameter": 0, "table": "STOCK", "column": "S_W_ID", "coefficient": 1.0 },
  { "procedure": "GetItem", "parameter": 0, "table": "ITEM", "column": "I_ID", "coefficient": 1.0 }
]"#;

fn query(table: &str, predicates: &[(&str, i64)], is_write: bool) -> QueryTrace {
    QueryTrace {
        table: table.into(),
        predicates: predicates.iter().map(|(c, v)| (c.to_string(), *v)).collect(),
        is_write,
    }
}

fn txn(procedure: &str, params: &[i64], queries: Vec<QueryTrace>) -> TransactionTrace {
    TransactionTrace {
        procedure: procedure.into(),
        params: params.iter().map(|&v| ParamValue::Scalar(v)).collect(),
        queries,
    }
}

fn workload() -> Workload {
    let mut transactions = Vec::new();
    for w in 0..4 {
        for o in 0..4 {
            let (o_id, i_id) = (w * 8 + o, (w + o) % 10);
            transactions.push(txn(
                "NewOrder",
                &[w, o_id, i_id],
                vec![
                    query("WAREHOUSE", &[("W_ID", w)], false),
                    query("STOCK", &[("S_W_ID", w), ("S_I_ID", i_id)], true),
                    query("ORDERS", &[("O_W_ID", w), ("O_ID", o_id)], true),
                    query("ITEM", &[("I_ID", i_id)], false),
                ],
            ));
        }
        transactions.push(txn(
            "StockLevel",
            &[w],
            vec![query("STOCK", &[("S_W_ID", w)], false)],
        ));
    }
    for i in 0..10 {
        transactions.push(txn("GetItem", &[i], vec![query("ITEM", &[("I_ID", i)], false)]));
    }
    Workload { transactions }
}

/// Writes catalog, workload and correlations into `dir` and returns a
/// config pointing at them.
fn fixture(dir: &Path) -> DesignerConfig {
    let catalog_path = dir.join("catalog.json");
    let workload_path = dir.join("workload.json");
    let correlations_path = dir.join("correlations.json");
    std::fs::write(&catalog_path, CATALOG).unwrap();
    std::fs::write(&correlations_path, CORRELATIONS).unwrap();
    std::fs::write(&workload_path, serde_json::to_string(&workload()).unwrap()).unwrap();

    let toml = format!(
        r#"
catalog_path = "{}"
workload_path = "{}"
correlations_path = "{}"
output_path = "{}"
strategy = "lns"

[hints]
limit_restarts = 3
relaxation_min_size = 1
relaxation_factor_max = 0.5
random_seed = 7
"#,
        catalog_path.display(),
        workload_path.display(),
        correlations_path.display(),
        dir.join("plan.json").display(),
    );
    let config_path = dir.join("designer.toml");
    std::fs::write(&config_path, toml).unwrap();
    DesignerConfig::from_file(&config_path).unwrap()
}

// ── Full Pipeline Tests ────────────────────────────────────────

#[tokio::test]
async fn test_end_to_end_lns() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());

    let loaded = Designer::new(config).load_inputs().unwrap();
    assert_eq!(loaded.context().correlations.len(), 8);
    assert_eq!(loaded.context().workload.len(), 30);

    let output = loaded.run().await.unwrap();
    assert_eq!(output.metrics.strategy, "lns");
    assert_eq!(output.metrics.rounds.len(), 3);
    assert!(output.metrics.final_cost <= output.metrics.baseline_cost);

    // Every procedure is routed and the catalog carries the plan.
    assert_eq!(output.plan.procedures.len(), 3);
    assert_eq!(output.plan.num_unrouted(), 0);
    assert_eq!(output.plan, PartitionPlan::from_catalog(&output.catalog));

    let written: PartitionPlan =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("plan.json")).unwrap())
            .unwrap();
    assert_eq!(written, output.plan);
}

#[tokio::test]
async fn test_end_to_end_most_popular() {
    let dir = tempfile::tempdir().unwrap();
    let config = DesignerConfig {
        strategy: "most-popular".into(),
        ..fixture(dir.path())
    };
    let output = Designer::new(config).load_inputs().unwrap().run().await.unwrap();

    assert!(output.metrics.rounds.is_empty());
    assert!(output.metrics.final_cost <= output.metrics.baseline_cost);
    // STOCK's most popular column is the warehouse key it shares with
    // StockLevel.
    assert_eq!(
        output.plan.table("STOCK"),
        Some(&PartitionAttribute::column("S_W_ID"))
    );
}

// ── Memory Budget ──────────────────────────────────────────────

#[tokio::test]
async fn test_memory_budget_respected() {
    let dir = tempfile::tempdir().unwrap();
    let config = DesignerConfig {
        memory_budget: "32K".into(),
        ..fixture(dir.path())
    };
    let output = Designer::new(config).load_inputs().unwrap().run().await.unwrap();

    assert_eq!(output.metrics.memory_budget_bytes, 32 * 1024);
    assert!(output.metrics.memory_bytes <= 32 * 1024);
    assert!(output.metrics.summary().contains("of budget"));
}

#[tokio::test]
async fn test_budget_below_partitioned_size_fails() {
    // All four tables partitioned need 20_500 bytes per partition.
    let dir = tempfile::tempdir().unwrap();
    let config = DesignerConfig {
        memory_budget: "16K".into(),
        ..fixture(dir.path())
    };
    let err = Designer::new(config)
        .load_inputs()
        .unwrap()
        .run()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DesignerError::PlannerError(PlannerError::InsufficientMemory { .. })
    ));
}

// ── Checkpointing ──────────────────────────────────────────────

#[tokio::test]
async fn test_resume_from_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = dir.path().join("lns.checkpoint");
    let config = DesignerConfig {
        checkpoint_path: Some(checkpoint.clone()),
        ..fixture(dir.path())
    };

    Designer::new(config.clone())
        .load_inputs()
        .unwrap()
        .run()
        .await
        .unwrap();
    let saved = SearchState::load(&checkpoint).unwrap();
    assert_eq!(saved.restart_counter, 2);

    let mut config = config;
    config.hints.limit_restarts = Some(5);
    let second = Designer::new(config)
        .load_inputs()
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(second.metrics.rounds.len(), 3);
    assert_eq!(second.metrics.rounds[0].restart, 2);
    assert!(second.metrics.final_cost <= second.metrics.baseline_cost);
    assert_eq!(SearchState::load(&checkpoint).unwrap().restart_counter, 4);
}

// ── Errors ─────────────────────────────────────────────────────

#[test]
fn test_unknown_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let config = DesignerConfig {
        strategy: "tabu".into(),
        ..fixture(dir.path())
    };
    let err = Designer::new(config)
        .load_inputs()
        .unwrap()
        .run_blocking()
        .unwrap_err();
    assert!(matches!(err, DesignerError::PlannerError(PlannerError::Config(_))));
}

#[test]
fn test_missing_workload() {
    let dir = tempfile::tempdir().unwrap();
    let config = DesignerConfig {
        workload_path: dir.path().join("absent.json"),
        ..fixture(dir.path())
    };
    let err = Designer::new(config).load_inputs().unwrap_err();
    assert!(matches!(err, DesignerError::CostModelError(_)));
}

// ── Config Roundtrip ───────────────────────────────────────────

#[test]
fn test_config_toml_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());
    let back = DesignerConfig::from_toml(&config.to_toml().unwrap()).unwrap();
    assert_eq!(back.catalog_path, config.catalog_path);
    assert_eq!(back.hints.random_seed, Some(7));
    assert_eq!(back.hints.relaxation_min_size, 1);
}
