//! Catalog commands - inspect data model versions and upgrade mappings

use crate::cli::config::{open_catalog, CatalogArg, MagicConfig};
use crate::cli::error::HelpfulError;
use crate::cli::output::print_table;
use clap::Subcommand;
use magic_contribution::{build_upgrade_map, SchemaCatalog, UpgradeMap};

#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// List data model versions, oldest first
    Versions {
        #[command(flatten)]
        catalog: CatalogArg,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how columns of the previous version map into VERSION
    Map {
        /// Target data model version
        version: String,

        #[command(flatten)]
        catalog: CatalogArg,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: CatalogAction, config: &MagicConfig) -> anyhow::Result<()> {
    match action {
        CatalogAction::Versions { catalog, json } => {
            let catalog = open_catalog(&catalog, config)?;
            versions(&catalog, json)
        }
        CatalogAction::Map {
            version,
            catalog,
            json,
        } => {
            let catalog = open_catalog(&catalog, config)?;
            map(&catalog, &version, json)
        }
    }
}

fn versions(catalog: &SchemaCatalog, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog.versions())?);
        return Ok(());
    }

    let rows = catalog
        .versions()
        .iter()
        .enumerate()
        .map(|(idx, version)| {
            let tables = catalog
                .model(version)
                .map(|m| m.tables.len())
                .unwrap_or_default();
            let marker = if catalog.is_newest(version) { "newest" } else { "" };
            vec![(idx + 1).to_string(), version.clone(), tables.to_string(), marker.to_string()]
        })
        .collect();
    print_table(&["#", "VERSION", "TABLES", ""], rows);
    Ok(())
}

/// Upgrade map into `version`, rejecting unknown versions and the oldest one
pub fn map_for_version(catalog: &SchemaCatalog, version: &str) -> Result<UpgradeMap, HelpfulError> {
    let model = catalog
        .model(version)
        .filter(|_| catalog.contains(version))
        .ok_or_else(|| HelpfulError::unknown_version(version, &catalog.quoted_versions()))?;

    if catalog.position(version) == Some(0) {
        return Err(HelpfulError::new(format!(
            "Version {} is the oldest data model version",
            version
        ))
        .with_context("Nothing upgrades into the oldest version")
        .with_suggestions([format!(
            "TRY: Pick one of the newer versions: {}",
            catalog.versions()[1..].join(", ")
        )]));
    }

    Ok(build_upgrade_map(model))
}

/// One row per (previous table, previous column)
pub fn map_rows(map: &UpgradeMap) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for (table, columns) in map.tables() {
        for (column, destinations) in columns {
            let targets = destinations
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            rows.push(vec![table.to_string(), column.clone(), targets]);
        }
    }
    rows
}

fn map(catalog: &SchemaCatalog, version: &str, json: bool) -> anyhow::Result<()> {
    let map = map_for_version(catalog, version)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    println!("UPGRADE MAP INTO {}", version);
    print_table(&["TABLE", "COLUMN", "BECOMES"], map_rows(&map));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "versions": ["2.5", "3.0"],
        "models": {
            "2.5": { "tables": { "er_sites": { "columns": { "er_site_name": {}, "site_int": {} } } } },
            "3.0": { "tables": { "sites": { "columns": {
                "site": { "previous_columns": [{ "table": "er_sites", "column": "er_site_name" }] },
                "int_abs": { "previous_columns": [{ "table": "er_sites", "column": "site_int" }] },
                "int_abs_mean": { "previous_columns": [{ "table": "er_sites", "column": "site_int" }] }
            } } } }
        }
    }"#;

    #[test]
    fn test_map_rows() {
        let catalog = SchemaCatalog::from_json_str(CATALOG).unwrap();
        let map = map_for_version(&catalog, "3.0").unwrap();

        assert_eq!(
            map_rows(&map),
            vec![
                vec!["er_sites".to_string(), "er_site_name".to_string(), "sites.site".to_string()],
                vec![
                    "er_sites".to_string(),
                    "site_int".to_string(),
                    "sites.int_abs, sites.int_abs_mean".to_string()
                ],
            ]
        );
    }

    #[test]
    fn test_map_rejects_unknown_and_oldest() {
        let catalog = SchemaCatalog::from_json_str(CATALOG).unwrap();

        let err = map_for_version(&catalog, "9.9").unwrap_err();
        assert!(err.message.contains("Unknown data model version"));

        let err = map_for_version(&catalog, "2.5").unwrap_err();
        assert!(err.message.contains("oldest"));
    }
}
