// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Workload traces.
//!
//! A [`Workload`] is a sample of executed transactions. Each trace keeps the
//! invocation's parameter values and, per query, the table it touched plus
//! the equality predicates it used. That is enough to decide where an
//! invocation would have run under any plan.
//!
//! # Format
//! ```json
//! {
//!   "transactions": [
//!     {
//!       "procedure": "NewOrder",
//!       "params": [3, [10, 11]],
//!       "queries": [
//!         { "table": "WAREHOUSE", "predicates": { "W_ID": 3 } },
//!         { "table": "STOCK", "predicates": { "S_W_ID": 3, "S_I_ID": 10 }, "is_write": true }
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::CostModelError;
use catalog_model::ColumnRef;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// A traced parameter value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(i64),
    Array(Vec<i64>),
}

impl ParamValue {
    /// Returns the value if it is a scalar.
    pub fn as_scalar(&self) -> Option<i64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Array(_) => None,
        }
    }
}

/// One query executed by a traced transaction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QueryTrace {
    pub table: String,
    /// Equality predicates `column = value`.
    #[serde(default)]
    pub predicates: BTreeMap<String, i64>,
    #[serde(default)]
    pub is_write: bool,
}

/// One traced procedure invocation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransactionTrace {
    pub procedure: String,
    #[serde(default)]
    pub params: Vec<ParamValue>,
    #[serde(default)]
    pub queries: Vec<QueryTrace>,
}

/// Per-procedure column access counts.
pub type ColumnHistogram = BTreeMap<ColumnRef, u64>;

/// A sample workload.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Workload {
    #[serde(default)]
    pub transactions: Vec<TransactionTrace>,
}

impl Workload {
    /// Loads a workload from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, CostModelError> {
        let content = std::fs::read_to_string(path).map_err(|source| CostModelError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        let workload = Self::from_json(&content)?;
        tracing::info!(
            "loaded {} transactions from '{}'",
            workload.len(),
            path.display()
        );
        Ok(workload)
    }

    /// Parses a workload from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CostModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Traces of one procedure.
    pub fn for_procedure<'a>(
        &'a self,
        procedure: &'a str,
    ) -> impl Iterator<Item = &'a TransactionTrace> + 'a {
        self.transactions
            .iter()
            .filter(move |t| t.procedure == procedure)
    }

    /// Column access histograms keyed by procedure name.
    ///
    /// Every predicate column of every query counts once. Procedures without
    /// traces get no entry.
    pub fn column_histograms(&self) -> HashMap<String, ColumnHistogram> {
        let mut out: HashMap<String, ColumnHistogram> = HashMap::new();
        for txn in &self.transactions {
            let hist = out.entry(txn.procedure.clone()).or_default();
            for q in &txn.queries {
                for column in q.predicates.keys() {
                    *hist.entry(ColumnRef::new(&q.table, column)).or_default() += 1;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "transactions": [
            { "procedure": "P", "params": [1, [2, 3]],
              "queries": [{ "table": "T", "predicates": { "A": 1, "B": 7 } },
                          { "table": "T", "predicates": { "A": 1 }, "is_write": true }] },
            { "procedure": "Q", "params": [] }
        ]
    }"#;

    #[test]
    fn test_parse() {
        let w = Workload::from_json(JSON).unwrap();
        assert_eq!(w.len(), 2);
        let p = &w.transactions[0];
        assert_eq!(p.params[0].as_scalar(), Some(1));
        assert_eq!(p.params[1], ParamValue::Array(vec![2, 3]));
        assert!(p.queries[1].is_write);
        assert_eq!(w.for_procedure("Q").count(), 1);
    }

    #[test]
    fn test_column_histograms() {
        let w = Workload::from_json(JSON).unwrap();
        let h = w.column_histograms();
        let p = &h["P"];
        assert_eq!(p[&ColumnRef::new("T", "A")], 2);
        assert_eq!(p[&ColumnRef::new("T", "B")], 1);
        assert!(h["Q"].is_empty());
        assert!(!h.contains_key("R"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workload.json");
        std::fs::write(&path, JSON).unwrap();
        assert_eq!(Workload::from_file(&path).unwrap().len(), 2);
        assert!(matches!(
            Workload::from_file(&dir.path().join("missing.json")),
            Err(CostModelError::ReadError { .. })
        ));
    }
}
