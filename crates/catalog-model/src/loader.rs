// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Catalog loading from a manifest file or a project directory.

use crate::catalog::Validated;
use crate::{Catalog, CatalogError, CatalogManifest};
use std::path::{Path, PathBuf};

/// Default manifest filename inside a project directory.
const MANIFEST_FILE: &str = "catalog.json";

/// Loads a catalog from disk into a validated [`Catalog`].
///
/// # Example
/// ```no_run
/// use catalog_model::CatalogLoader;
/// use std::path::Path;
///
/// let catalog = CatalogLoader::load(Path::new("./designs/tpcc")).unwrap();
/// println!("{}", catalog.summary());
/// ```
pub struct CatalogLoader;

impl CatalogLoader {
    /// Loads and validates a catalog.
    ///
    /// `path` may be the manifest itself or a directory containing
    /// `catalog.json`.
    pub fn load(path: &Path) -> Result<Catalog<Validated>, CatalogError> {
        let manifest_path = Self::resolve(path);
        let manifest = CatalogManifest::from_file(&manifest_path)?;
        let catalog = manifest.into_catalog()?.validate()?;
        tracing::debug!("loaded {} from '{}'", catalog.summary(), manifest_path.display());
        Ok(catalog)
    }

    /// Parses and validates a catalog from a JSON string.
    pub fn from_json(json: &str) -> Result<Catalog<Validated>, CatalogError> {
        CatalogManifest::from_json(json)?.into_catalog()?.validate()
    }

    fn resolve(path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "name": "disk",
        "num_partitions": 3,
        "tables": [{ "name": "T", "columns": ["ID"] }]
    }"#;

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), JSON).unwrap();
        let catalog = CatalogLoader::load(dir.path()).unwrap();
        assert_eq!(catalog.name, "disk");
        assert_eq!(catalog.num_tables(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, JSON).unwrap();
        assert_eq!(CatalogLoader::load(&path).unwrap().num_partitions, 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CatalogLoader::load(&dir.path().join("nope.json"));
        assert!(matches!(err, Err(CatalogError::ReadError { .. })));
    }
}
