//! Schema Catalog
//!
//! The versioned data model definitions that drive upgrading. The catalog is
//! supplied from outside (usually a JSON file) and never mutated:
//!
//! ```json
//! {
//!   "versions": ["2.4", "2.5", "3.0"],
//!   "models": {
//!     "3.0": { "tables": { "sites": { "columns": {
//!       "site": { "previous_columns": [{ "table": "er_sites", "column": "er_site_name" }] }
//!     } } } }
//!   }
//! }
//! ```
//!
//! Version order is the order of `versions`; later means newer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors loading or validating a schema catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog lists no data model versions")]
    NoVersions,

    #[error("Data model version \"{0}\" is listed more than once")]
    DuplicateVersion(String),

    #[error("Data model version \"{0}\" has no model definition")]
    MissingModel(String),
}

/// A `(table, column)` pair in some data model version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// A column in one data model version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Predecessor column(s) in the immediately prior version.
    /// Empty means the column is new in this version.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_columns: Vec<ColumnRef>,
}

impl ColumnDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_previous(previous: impl IntoIterator<Item = ColumnRef>) -> Self {
        Self {
            previous_columns: previous.into_iter().collect(),
        }
    }
}

/// A table in one data model version; columns in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    #[serde(default)]
    pub columns: IndexMap<String, ColumnDefinition>,
}

impl TableDefinition {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn with_column(mut self, name: impl Into<String>, column: ColumnDefinition) -> Self {
        self.columns.insert(name.into(), column);
        self
    }
}

/// One data model version; tables in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModel {
    #[serde(default)]
    pub tables: IndexMap<String, TableDefinition>,
}

impl DataModel {
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn with_table(mut self, name: impl Into<String>, table: TableDefinition) -> Self {
        self.tables.insert(name.into(), table);
        self
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    versions: Vec<String>,
    #[serde(default)]
    models: IndexMap<String, DataModel>,
}

impl TryFrom<RawCatalog> for SchemaCatalog {
    type Error = CatalogError;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        SchemaCatalog::new(raw.versions, raw.models)
    }
}

/// Ordered version list plus a model per version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct SchemaCatalog {
    versions: Vec<String>,
    models: IndexMap<String, DataModel>,
}

impl SchemaCatalog {
    /// Build a catalog, checking that versions are unique and all have models.
    pub fn new(
        versions: Vec<String>,
        models: IndexMap<String, DataModel>,
    ) -> Result<Self, CatalogError> {
        if versions.is_empty() {
            return Err(CatalogError::NoVersions);
        }

        let mut seen = HashSet::new();
        for version in &versions {
            if !seen.insert(version.as_str()) {
                return Err(CatalogError::DuplicateVersion(version.clone()));
            }
            if !models.contains_key(version) {
                return Err(CatalogError::MissingModel(version.clone()));
            }
        }

        Ok(Self { versions, models })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            versions = catalog.versions.len(),
            "Loaded schema catalog"
        );
        Ok(catalog)
    }

    /// Known versions, oldest first
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn contains(&self, version: &str) -> bool {
        self.position(version).is_some()
    }

    pub fn position(&self, version: &str) -> Option<usize> {
        self.versions.iter().position(|v| v == version)
    }

    /// The version right after `version`, if any
    pub fn next_version(&self, version: &str) -> Option<&str> {
        let idx = self.position(version)?;
        self.versions.get(idx + 1).map(String::as_str)
    }

    /// Newest known version
    pub fn newest(&self) -> &str {
        // Non-empty by construction
        self.versions.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_newest(&self, version: &str) -> bool {
        self.newest() == version
    }

    pub fn model(&self, version: &str) -> Option<&DataModel> {
        self.models.get(version)
    }

    /// `"2.4", "2.5", "3.0"` for messages
    pub fn quoted_versions(&self) -> String {
        self.versions
            .iter()
            .map(|v| format!("\"{}\"", v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
