//! Column-Mapping Builder
//!
//! Derives, from one data model version's column lineage, where each column
//! of the previous version goes in that version:
//!
//! - **Rename**: a column with exactly one predecessor (same name counts too)
//! - **Merge**: a column with two or more predecessors; each maps to it
//! - **Split**: a predecessor claimed by a second new column; it maps to every
//!   column that has claimed it so far
//!
//! Previous columns that end up with no destination were deleted in the new
//! version. That is not an error here; the upgrade engine reports it.

use crate::catalog::{ColumnRef, DataModel};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

/// Old table -> old column -> destinations in the new version.
///
/// Built fresh for every version transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UpgradeMap {
    tables: IndexMap<String, IndexMap<String, Vec<ColumnRef>>>,
}

impl UpgradeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destinations for an old column; `None` means the column was deleted
    pub fn destinations(&self, table: &str, column: &str) -> Option<&[ColumnRef]> {
        self.tables
            .get(table)
            .and_then(|columns| columns.get(column))
            .map(Vec::as_slice)
    }

    /// Column mappings of one old table
    pub fn table(&self, table: &str) -> Option<&IndexMap<String, Vec<ColumnRef>>> {
        self.tables.get(table)
    }

    /// Old tables with their column mappings, in discovery order
    pub fn tables(&self) -> impl Iterator<Item = (&str, &IndexMap<String, Vec<ColumnRef>>)> {
        self.tables.iter().map(|(name, columns)| (name.as_str(), columns))
    }

    /// Number of mapped old columns
    pub fn len(&self) -> usize {
        self.tables.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Add a destination for an old column, ignoring duplicates
    fn add(&mut self, source: &ColumnRef, destination: &ColumnRef) {
        let destinations = self
            .tables
            .entry(source.table.clone())
            .or_default()
            .entry(source.column.clone())
            .or_default();
        if !destinations.contains(destination) {
            destinations.push(destination.clone());
        }
    }
}

/// Build the map from the previous version into `new_model`.
///
/// Tables and columns are visited in declaration order, so split detection
/// and destination order are deterministic.
pub fn build_upgrade_map(new_model: &DataModel) -> UpgradeMap {
    let mut map = UpgradeMap::new();
    // Predecessor -> new columns that claimed it, first claimant first
    let mut claimants: HashMap<&ColumnRef, Vec<ColumnRef>> = HashMap::new();

    for (table_name, table) in &new_model.tables {
        for (column_name, column) in &table.columns {
            let lineage = &column.previous_columns;
            if lineage.is_empty() {
                continue;
            }
            let destination = ColumnRef::new(table_name.as_str(), column_name.as_str());

            for predecessor in lineage {
                let claimed = claimants.entry(predecessor).or_default();
                if !claimed.contains(&destination) {
                    claimed.push(destination.clone());
                }
                if claimed.len() > 1 {
                    trace!(%predecessor, into = claimed.len(), "Split column");
                    for split in claimed.iter() {
                        map.add(predecessor, split);
                    }
                }
            }

            if let [predecessor] = lineage.as_slice() {
                trace!(%predecessor, %destination, "Renamed column");
                map.add(predecessor, &destination);
            } else {
                trace!(%destination, from = lineage.len(), "Merged column");
                for predecessor in lineage {
                    map.add(predecessor, &destination);
                }
            }
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDefinition, TableDefinition};

    fn col(table: &str, column: &str) -> ColumnRef {
        ColumnRef::new(table, column)
    }

    fn lineage(previous: &[(&str, &str)]) -> ColumnDefinition {
        ColumnDefinition::from_previous(previous.iter().map(|(t, c)| col(t, c)))
    }

    #[test]
    fn test_rename() {
        let model = DataModel::default().with_table(
            "sites",
            TableDefinition::default().with_column("site", lineage(&[("er_sites", "er_site_name")])),
        );

        let map = build_upgrade_map(&model);
        assert_eq!(
            map.destinations("er_sites", "er_site_name"),
            Some(&[col("sites", "site")][..])
        );
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_same_name_rename_is_recorded() {
        let model = DataModel::default().with_table(
            "contribution",
            TableDefinition::default()
                .with_column("magic_version", lineage(&[("contribution", "magic_version")])),
        );

        let map = build_upgrade_map(&model);
        assert_eq!(
            map.destinations("contribution", "magic_version"),
            Some(&[col("contribution", "magic_version")][..])
        );
    }

    #[test]
    fn test_carry_over_on_multi_column_table() {
        let model = DataModel::default().with_table(
            "sites",
            TableDefinition::default()
                .with_column("site", lineage(&[("sites", "site")]))
                .with_column("lat", lineage(&[("sites", "site_lat")]))
                .with_column("notes", ColumnDefinition::new()),
        );

        let map = build_upgrade_map(&model);
        assert_eq!(map.destinations("sites", "site"), Some(&[col("sites", "site")][..]));
        assert_eq!(map.destinations("sites", "site_lat"), Some(&[col("sites", "lat")][..]));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_merge() {
        let model = DataModel::default().with_table(
            "sites",
            TableDefinition::default().with_column(
                "geologic_types",
                lineage(&[("sites", "rock_type"), ("sites", "rock_class")]),
            ),
        );

        let map = build_upgrade_map(&model);
        let merged = [col("sites", "geologic_types")];
        assert_eq!(map.destinations("sites", "rock_type"), Some(&merged[..]));
        assert_eq!(map.destinations("sites", "rock_class"), Some(&merged[..]));
    }

    #[test]
    fn test_split() {
        let model = DataModel::default().with_table(
            "specimens",
            TableDefinition::default()
                .with_column("int_abs", lineage(&[("specimens", "intensity")]))
                .with_column("int_rel", lineage(&[("specimens", "intensity")])),
        );

        let map = build_upgrade_map(&model);
        assert_eq!(
            map.destinations("specimens", "intensity"),
            Some(&[col("specimens", "int_abs"), col("specimens", "int_rel")][..])
        );
    }

    #[test]
    fn test_three_way_split() {
        let model = DataModel::default().with_table(
            "specimens",
            TableDefinition::default()
                .with_column("a", lineage(&[("specimens", "x")]))
                .with_column("b", lineage(&[("specimens", "x")]))
                .with_column("c", lineage(&[("specimens", "x")])),
        );

        let map = build_upgrade_map(&model);
        assert_eq!(map.destinations("specimens", "x").map(|d| d.len()), Some(3));
    }

    #[test]
    fn test_split_across_tables_in_declaration_order() {
        let model = DataModel::default()
            .with_table(
                "sites",
                TableDefinition::default().with_column("site", lineage(&[("er_sites", "name")])),
            )
            .with_table(
                "locations",
                TableDefinition::default().with_column("location", lineage(&[("er_sites", "name")])),
            );

        let map = build_upgrade_map(&model);
        assert_eq!(
            map.destinations("er_sites", "name"),
            Some(&[col("sites", "site"), col("locations", "location")][..])
        );
    }

    #[test]
    fn test_keys_do_not_collide() {
        // "ab" + "c" and "a" + "bc" are distinct predecessors, not a split
        let model = DataModel::default().with_table(
            "t",
            TableDefinition::default()
                .with_column("x", lineage(&[("ab", "c")]))
                .with_column("y", lineage(&[("a", "bc")])),
        );

        let map = build_upgrade_map(&model);
        assert_eq!(map.destinations("ab", "c"), Some(&[col("t", "x")][..]));
        assert_eq!(map.destinations("a", "bc"), Some(&[col("t", "y")][..]));
    }

    #[test]
    fn test_new_and_deleted_columns_have_no_entry() {
        let model = DataModel::default().with_table(
            "sites",
            TableDefinition::default().with_column("brand_new", ColumnDefinition::new()),
        );

        let map = build_upgrade_map(&model);
        assert!(map.is_empty());
        assert_eq!(map.destinations("sites", "old_column"), None);
    }
}
