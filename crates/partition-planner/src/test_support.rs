// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shared fixtures for unit tests: a four-table order-entry schema.

use crate::{DesignContext, DesignerHints};
use catalog_model::catalog::Validated;
use catalog_model::{
    Catalog, ColumnRef, Correlation, ParameterCorrelations, ProcedureDef, TableDef, TableStats,
};
use cost_model::{
    CostModel, CostModelError, ParamValue, QueryTrace, SingleSitedCostModel, TransactionTrace,
    Workload,
};
use memory_estimator::TableSizeEstimator;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

fn stats(tuples: u64, bytes: u64) -> Option<TableStats> {
    Some(TableStats {
        tuple_count: tuples,
        tuple_size_total: bytes,
    })
}

pub fn catalog() -> Catalog<Validated> {
    let tables = vec![
        TableDef::new("WAREHOUSE", &["W_ID", "W_NAME"], stats(4, 400)),
        TableDef::new("DISTRICT", &["D_ID", "D_W_ID", "D_NAME"], stats(12, 4_000)),
        TableDef::new("CUSTOMER", &["C_ID", "C_W_ID", "C_NAME"], stats(24, 80_000)),
        TableDef::new("ITEM", &["I_ID", "I_NAME"], stats(10, 10_000)),
    ];
    let mut new_order = ProcedureDef::new(
        "NewOrder",
        &["w_id", "d_id", "i_ids"],
        vec![
            ColumnRef::new("WAREHOUSE", "W_ID"),
            ColumnRef::new("DISTRICT", "D_ID"),
            ColumnRef::new("DISTRICT", "D_W_ID"),
            ColumnRef::new("ITEM", "I_ID"),
        ],
    );
    new_order.parameters[2].is_array = true;
    let payment = ProcedureDef::new(
        "Payment",
        &["w_id", "d_id", "c_id"],
        vec![
            ColumnRef::new("WAREHOUSE", "W_ID"),
            ColumnRef::new("DISTRICT", "D_ID"),
            ColumnRef::new("DISTRICT", "D_W_ID"),
            ColumnRef::new("CUSTOMER", "C_ID"),
            ColumnRef::new("CUSTOMER", "C_W_ID"),
        ],
    );
    let get_item = ProcedureDef::new("GetItem", &["i_id"], vec![ColumnRef::new("ITEM", "I_ID")]);
    let mut stats_proc = ProcedureDef::new("@Stats", &["x"], vec![]);
    stats_proc.system = true;

    Catalog::new(
        "orders",
        4,
        tables,
        vec![new_order, payment, get_item, stats_proc],
    )
    .validate()
    .unwrap()
}

fn query(table: &str, predicates: &[(&str, i64)], is_write: bool) -> QueryTrace {
    QueryTrace {
        table: table.to_string(),
        predicates: predicates
            .iter()
            .map(|(c, v)| (c.to_string(), *v))
            .collect::<BTreeMap<_, _>>(),
        is_write,
    }
}

pub fn workload() -> Workload {
    let mut transactions = Vec::new();
    for w in 0..4i64 {
        for d in 0..3i64 {
            let (i1, i2) = ((w + d) % 10, (w * 3 + d) % 10);
            transactions.push(TransactionTrace {
                procedure: "NewOrder".into(),
                params: vec![
                    ParamValue::Scalar(w),
                    ParamValue::Scalar(d),
                    ParamValue::Array(vec![i1, i2]),
                ],
                queries: vec![
                    query("WAREHOUSE", &[("W_ID", w)], false),
                    query("DISTRICT", &[("D_W_ID", w), ("D_ID", d)], true),
                    query("ITEM", &[("I_ID", i1)], false),
                    query("ITEM", &[("I_ID", i2)], false),
                ],
            });
            for c in 0..2i64 {
                transactions.push(TransactionTrace {
                    procedure: "Payment".into(),
                    params: vec![
                        ParamValue::Scalar(w),
                        ParamValue::Scalar(d),
                        ParamValue::Scalar(c),
                    ],
                    queries: vec![
                        query("WAREHOUSE", &[("W_ID", w)], true),
                        query("DISTRICT", &[("D_W_ID", w), ("D_ID", d)], true),
                        query("CUSTOMER", &[("C_W_ID", w), ("C_ID", c)], true),
                    ],
                });
            }
        }
    }
    for i in 0..10i64 {
        transactions.push(TransactionTrace {
            procedure: "GetItem".into(),
            params: vec![ParamValue::Scalar(i)],
            queries: vec![query("ITEM", &[("I_ID", i)], false)],
        });
    }
    Workload { transactions }
}

pub fn correlations() -> ParameterCorrelations {
    let mut store = ParameterCorrelations::new();
    let entries: &[(&str, usize, &str, &str)] = &[
        ("NewOrder", 0, "WAREHOUSE", "W_ID"),
        ("NewOrder", 0, "DISTRICT", "D_W_ID"),
        ("NewOrder", 1, "DISTRICT", "D_ID"),
        ("Payment", 0, "WAREHOUSE", "W_ID"),
        ("Payment", 0, "DISTRICT", "D_W_ID"),
        ("Payment", 0, "CUSTOMER", "C_W_ID"),
        ("Payment", 1, "DISTRICT", "D_ID"),
        ("Payment", 2, "CUSTOMER", "C_ID"),
        ("GetItem", 0, "ITEM", "I_ID"),
    ];
    for &(procedure, parameter, table, column) in entries {
        store.add(Correlation {
            procedure: procedure.into(),
            parameter,
            table: table.into(),
            column: column.into(),
            coefficient: 1.0,
        });
    }
    store
}

pub fn context() -> DesignContext {
    DesignContext::new(
        catalog(),
        workload(),
        Box::new(SingleSitedCostModel::new()),
        Box::new(TableSizeEstimator::new()),
    )
    .with_correlations(correlations())
}

pub fn hints() -> DesignerHints {
    DesignerHints {
        random_seed: Some(7),
        ..DesignerHints::default()
    }
}

/// Invalidation calls observed by a [`RecordingCostModel`].
#[derive(Debug, Default)]
pub struct Calls {
    pub tables: Vec<String>,
    pub procedures: Vec<String>,
    pub clears: usize,
}

/// Wraps the reference model and records every invalidation.
pub struct RecordingCostModel {
    inner: SingleSitedCostModel,
    pub calls: Arc<Mutex<Calls>>,
}

impl RecordingCostModel {
    pub fn new() -> (Self, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        (
            Self {
                inner: SingleSitedCostModel::new(),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl CostModel for RecordingCostModel {
    fn name(&self) -> &str {
        "recording"
    }

    fn estimate_cost(
        &mut self,
        catalog: &Catalog<Validated>,
        workload: &Workload,
    ) -> Result<f64, CostModelError> {
        self.inner.estimate_cost(catalog, workload)
    }

    fn invalidate_table(&mut self, table: &str) {
        self.calls.lock().unwrap().tables.push(table.to_string());
        self.inner.invalidate_table(table);
    }

    fn invalidate_procedure(&mut self, procedure: &str) {
        self.calls
            .lock()
            .unwrap()
            .procedures
            .push(procedure.to_string());
        self.inner.invalidate_procedure(procedure);
    }

    fn clear(&mut self, full: bool) {
        self.calls.lock().unwrap().clears += 1;
        self.inner.clear(full);
    }

    fn caching_enabled(&self) -> bool {
        self.inner.caching_enabled()
    }

    fn entropy_weight(&self) -> f64 {
        self.inner.entropy_weight()
    }

    fn set_entropy_weight(&mut self, weight: f64) {
        self.inner.set_entropy_weight(weight);
    }

    fn untouched_partitions(&self, num_partitions: u32) -> BTreeSet<u32> {
        self.inner.untouched_partitions(num_partitions)
    }
}
