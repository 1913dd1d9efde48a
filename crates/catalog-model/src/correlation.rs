// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Parameter → column correlation statistics.
//!
//! A [`Correlation`] records how strongly the value of a procedure parameter
//! predicts the value of a column its statements access. The coefficients
//! are computed offline from a workload trace; this module only stores and
//! looks them up.
//!
//! # Format
//! ```json
//! [
//!   { "procedure": "NewOrder", "parameter": 0,
//!     "table": "WAREHOUSE", "column": "W_ID", "coefficient": 1.0 }
//! ]
//! ```

use crate::catalog::Validated;
use crate::{Catalog, CatalogError};
use std::collections::HashMap;
use std::path::Path;

/// A single parameter/column correlation coefficient.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Correlation {
    pub procedure: String,
    pub parameter: usize,
    pub table: String,
    pub column: String,
    pub coefficient: f64,
}

/// Correlation statistics bound to a catalog.
#[derive(Debug, Clone, Default)]
pub struct ParameterCorrelations {
    by_parameter: HashMap<(String, usize), Vec<Correlation>>,
    count: usize,
}

impl ParameterCorrelations {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads correlations from a JSON file and binds them to `catalog`.
    pub fn load(path: &Path, catalog: &Catalog<Validated>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        let store = Self::from_json(&content, catalog)?;
        tracing::info!(
            "loaded {} correlations from '{}'",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Parses correlations from JSON and binds them to `catalog`.
    ///
    /// Every entry must name an existing procedure parameter and an existing
    /// column; an unresolved entry means the statistics were computed for a
    /// different schema.
    pub fn from_json(json: &str, catalog: &Catalog<Validated>) -> Result<Self, CatalogError> {
        let entries: Vec<Correlation> = serde_json::from_str(json)?;
        let mut store = Self::new();
        for c in entries {
            let proc = catalog
                .procedure(&c.procedure)
                .ok_or_else(|| CatalogError::UnknownProcedure(c.procedure.clone()))?;
            if proc.parameter(c.parameter).is_none() {
                return Err(CatalogError::InvalidParameter {
                    procedure: c.procedure.clone(),
                    index: c.parameter,
                    detail: "correlation refers to a missing parameter".into(),
                });
            }
            let table = catalog
                .table(&c.table)
                .ok_or_else(|| CatalogError::UnknownTable(c.table.clone()))?;
            if table.column(&c.column).is_none() {
                return Err(CatalogError::UnknownColumn {
                    table: c.table.clone(),
                    column: c.column.clone(),
                });
            }
            store.add(c);
        }
        Ok(store)
    }

    /// Adds a correlation without catalog checks.
    pub fn add(&mut self, correlation: Correlation) {
        self.by_parameter
            .entry((correlation.procedure.clone(), correlation.parameter))
            .or_default()
            .push(correlation);
        self.count += 1;
    }

    /// Correlations between `procedure`'s parameter and `table.column`.
    pub fn coefficients<'a>(
        &'a self,
        procedure: &str,
        parameter: usize,
        table: &'a str,
        column: &'a str,
    ) -> impl Iterator<Item = &'a Correlation> + 'a {
        self.by_parameter
            .get(&(procedure.to_string(), parameter))
            .into_iter()
            .flatten()
            .filter(move |c| c.table == table && c.column == column)
    }

    /// Total number of correlations.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if no correlations are stored.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnRef, ProcedureDef, TableDef};

    fn catalog() -> Catalog<Validated> {
        Catalog::new(
            "c",
            2,
            vec![TableDef::new("T", &["A", "B"], None)],
            vec![ProcedureDef::new(
                "P",
                &["p1", "p2"],
                vec![ColumnRef::new("T", "A")],
            )],
        )
        .validate()
        .unwrap()
    }

    #[test]
    fn test_from_json_and_lookup() {
        let json = r#"[
            {"procedure":"P","parameter":0,"table":"T","column":"A","coefficient":0.8},
            {"procedure":"P","parameter":1,"table":"T","column":"A","coefficient":0.2},
            {"procedure":"P","parameter":0,"table":"T","column":"B","coefficient":0.5}
        ]"#;
        let store = ParameterCorrelations::from_json(json, &catalog()).unwrap();
        assert_eq!(store.len(), 3);
        let hits: Vec<f64> = store
            .coefficients("P", 0, "T", "A")
            .map(|c| c.coefficient)
            .collect();
        assert_eq!(hits, vec![0.8]);
        assert_eq!(store.coefficients("P", 1, "T", "B").count(), 0);
        assert_eq!(store.coefficients("Q", 0, "T", "A").count(), 0);
    }

    #[test]
    fn test_unbound_entry_rejected() {
        let json = r#"[{"procedure":"P","parameter":0,"table":"T","column":"Z","coefficient":1.0}]"#;
        assert!(matches!(
            ParameterCorrelations::from_json(json, &catalog()),
            Err(CatalogError::UnknownColumn { .. })
        ));
        let json = r#"[{"procedure":"P","parameter":9,"table":"T","column":"A","coefficient":1.0}]"#;
        assert!(ParameterCorrelations::from_json(json, &catalog()).is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corr.json");
        std::fs::write(
            &path,
            r#"[{"procedure":"P","parameter":1,"table":"T","column":"A","coefficient":0.3}]"#,
        )
        .unwrap();
        let store = ParameterCorrelations::load(&path, &catalog()).unwrap();
        assert!(!store.is_empty());
    }
}
