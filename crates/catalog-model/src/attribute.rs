// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Candidate partitioning attributes and parameters.
//!
//! Both are tagged unions: an ordinary choice, a composite choice, or a
//! sentinel. The sentinels are first-class variants rather than special
//! columns/parameters, so matching on them is exhaustive.
//!
//! ```text
//! PartitionAttribute  = Column(c) | MultiColumn([c..]) | Replicated
//! PartitionParameter  = Parameter(i) | MultiParameter([i..]) | Null
//! ```

use std::fmt;

/// How a table's rows are routed to partitions.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PartitionAttribute {
    /// Hash-partition on a single column.
    Column(String),
    /// Hash-partition on the combined value of several columns.
    MultiColumn(Vec<String>),
    /// Store a full copy of the table on every partition.
    Replicated,
}

impl PartitionAttribute {
    /// Shorthand for [`PartitionAttribute::Column`].
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    /// Returns `true` for the replicated sentinel.
    pub fn is_replicated(&self) -> bool {
        matches!(self, Self::Replicated)
    }

    /// Returns the columns this attribute routes on (empty when replicated).
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::Column(c) => vec![c.as_str()],
            Self::MultiColumn(cs) => cs.iter().map(String::as_str).collect(),
            Self::Replicated => Vec::new(),
        }
    }
}

impl fmt::Display for PartitionAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(c) => f.write_str(c),
            Self::MultiColumn(cs) => write!(f, "<{}>", cs.join(",")),
            Self::Replicated => f.write_str("*replicated*"),
        }
    }
}

/// How a procedure invocation is routed to a partition.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PartitionParameter {
    /// Route on the value of the parameter at this index.
    Parameter(usize),
    /// Route on the combined value of several parameters.
    MultiParameter(Vec<usize>),
    /// No single parameter determines routing; the procedure is distributed.
    Null,
}

impl PartitionParameter {
    /// Returns `true` for the null sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the parameter indices this choice routes on.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Self::Parameter(i) => vec![*i],
            Self::MultiParameter(is) => is.clone(),
            Self::Null => Vec::new(),
        }
    }
}

impl Default for PartitionParameter {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for PartitionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter(i) => write!(f, "#{i}"),
            Self::MultiParameter(is) => {
                let parts: Vec<String> = is.iter().map(|i| format!("#{i}")).collect();
                write!(f, "<{}>", parts.join(","))
            }
            Self::Null => f.write_str("*null*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_columns() {
        assert_eq!(PartitionAttribute::column("W_ID").columns(), vec!["W_ID"]);
        let multi = PartitionAttribute::MultiColumn(vec!["A".into(), "B".into()]);
        assert_eq!(multi.columns(), vec!["A", "B"]);
        assert!(PartitionAttribute::Replicated.columns().is_empty());
        assert!(PartitionAttribute::Replicated.is_replicated());
    }

    #[test]
    fn test_parameter_indices() {
        assert_eq!(PartitionParameter::Parameter(2).indices(), vec![2]);
        assert_eq!(PartitionParameter::MultiParameter(vec![0, 3]).indices(), vec![0, 3]);
        assert!(PartitionParameter::Null.indices().is_empty());
        assert!(PartitionParameter::default().is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(PartitionAttribute::column("C_ID").to_string(), "C_ID");
        assert_eq!(PartitionAttribute::Replicated.to_string(), "*replicated*");
        assert_eq!(PartitionParameter::MultiParameter(vec![0, 1]).to_string(), "<#0,#1>");
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&PartitionAttribute::Replicated).unwrap();
        assert_eq!(json, r#"{"kind":"replicated"}"#);
        let back: PartitionParameter =
            serde_json::from_str(r#"{"kind":"parameter","value":1}"#).unwrap();
        assert_eq!(back, PartitionParameter::Parameter(1));
    }
}
