//! Structured Contribution
//!
//! A contribution is a set of named tables, each an ordered list of rows.
//! A row maps column names to string values. Table, row and column order is
//! insertion order and survives parsing, upgrading and JSON round trips.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Table that carries the contribution-level metadata row.
pub const CONTRIBUTION_TABLE: &str = "contribution";

/// Column of [`CONTRIBUTION_TABLE`] holding the data model version.
pub const VERSION_COLUMN: &str = "magic_version";

/// One data row: column name -> value, in column order.
pub type Row = IndexMap<String, String>;

/// Errors reading or writing a contribution as JSON.
#[derive(Debug, Error)]
pub enum ContributionError {
    #[error("Invalid contribution JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A contribution: table name -> rows.
///
/// Serializes to `{ "table": [ { "column": "value", ... }, ... ], ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contribution {
    tables: IndexMap<String, Vec<Row>>,
}

impl Contribution {
    /// Create an empty contribution
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the contribution has no tables at all
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Rows of a table, if the table exists
    pub fn table(&self, name: &str) -> Option<&[Row]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    /// Iterate tables in insertion order
    pub fn tables(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.tables
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// Table names in insertion order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Register a table. An existing table keeps its position and rows.
    pub fn insert_table(&mut self, name: impl Into<String>) {
        self.tables.entry(name.into()).or_default();
    }

    /// Append a row, registering the table if needed
    pub fn push_row(&mut self, table: impl Into<String>, row: Row) {
        self.tables.entry(table.into()).or_default().push(row);
    }

    /// Builder-style table with rows, handy for fixtures
    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables.entry(name.into()).or_default().extend(rows);
        self
    }

    /// The data model version recorded in the single contribution row.
    ///
    /// Returns `None` unless the contribution table exists, has exactly one
    /// row, and that row has a non-empty version value.
    pub fn version(&self) -> Option<&str> {
        match self.table(CONTRIBUTION_TABLE) {
            Some([only]) => only
                .get(VERSION_COLUMN)
                .map(String::as_str)
                .filter(|v| !v.is_empty()),
            _ => None,
        }
    }

    /// Parse a contribution from its JSON form
    pub fn from_json_str(json: &str) -> Result<Self, ContributionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty JSON rendering
    pub fn to_json_pretty(&self) -> Result<String, ContributionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build a [`Row`] from `(column, value)` pairs.
pub fn row<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Row
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_requires_single_row() {
        let single = Contribution::new()
            .with_table(CONTRIBUTION_TABLE, vec![row([(VERSION_COLUMN, "3.0")])]);
        assert_eq!(single.version(), Some("3.0"));

        let double = Contribution::new().with_table(
            CONTRIBUTION_TABLE,
            vec![row([(VERSION_COLUMN, "3.0")]), row([(VERSION_COLUMN, "2.5")])],
        );
        assert_eq!(double.version(), None);

        let blank = Contribution::new()
            .with_table(CONTRIBUTION_TABLE, vec![row([(VERSION_COLUMN, "")])]);
        assert_eq!(blank.version(), None);
    }

    #[test]
    fn test_json_preserves_order() {
        let json = r#"{"sites":[{"site":"a","lat":"1.5"}],"contribution":[{"magic_version":"2.5"}]}"#;
        let contribution = Contribution::from_json_str(json).unwrap();

        let names: Vec<&str> = contribution.table_names().collect();
        assert_eq!(names, vec!["sites", "contribution"]);

        let columns: Vec<&String> = contribution.table("sites").unwrap()[0].keys().collect();
        assert_eq!(columns, vec!["site", "lat"]);

        assert_eq!(serde_json::to_string(&contribution).unwrap(), json);
    }

    #[test]
    fn test_numbers_are_rejected() {
        let err = Contribution::from_json_str(r#"{"sites":[{"lat":1.5}]}"#).unwrap_err();
        assert!(matches!(err, ContributionError::Json(_)));
    }

    #[test]
    fn test_insert_table_keeps_rows() {
        let mut contribution = Contribution::new();
        contribution.push_row("sites", row([("site", "a")]));
        contribution.insert_table("sites");
        assert_eq!(contribution.table("sites").unwrap().len(), 1);
    }
}
