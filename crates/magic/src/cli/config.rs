//! Configuration for the MagIC CLI
//!
//! Paths default under ~/.magic/ (or `MAGIC_HOME`). An optional
//! `config.toml` there supplies defaults for flags not given on the
//! command line:
//!
//! ```toml
//! [catalog]
//! path = "/data/magic/data_models.json"
//!
//! [upgrade]
//! max_version = "3.0"
//!
//! [logging]
//! filter = "magic=debug"
//! ```

use crate::cli::error::HelpfulError;
use magic_contribution::{CatalogError, SchemaCatalog};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use magic_logging::{logs_dir, magic_home};

/// Catalog file name looked up under the home directory
pub const DEFAULT_CATALOG_FILE: &str = "data_models.json";

/// Contents of config.toml. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MagicConfig {
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub upgrade: UpgradeSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeSection {
    pub max_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    pub filter: Option<String>,
}

/// Get the config file path: ~/.magic/config.toml
pub fn config_path() -> PathBuf {
    magic_home().join("config.toml")
}

/// Load configuration from a file; a missing file yields the defaults
pub fn load_config(path: &Path) -> Result<MagicConfig, HelpfulError> {
    if !path.exists() {
        return Ok(MagicConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| HelpfulError::cannot_read_file(path, &e.to_string()))?;
    toml::from_str(&content).map_err(|e| HelpfulError::invalid_config(path, &e.to_string()))
}

/// Where the catalog path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    /// `--catalog` or `MAGIC_CATALOG`
    Flag,
    /// `[catalog] path` in config.toml
    Config,
    /// `<home>/data_models.json`
    Default,
}

impl CatalogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSource::Flag => "flag",
            CatalogSource::Config => "config",
            CatalogSource::Default => "default",
        }
    }
}

/// Catalog location flag shared by every command that reads the catalog
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CatalogArg {
    /// Schema catalog JSON (versions and data models)
    #[arg(long, env = "MAGIC_CATALOG")]
    pub catalog: Option<PathBuf>,
}

/// Determine the catalog path.
///
/// Priority:
/// 1. `--catalog` / `MAGIC_CATALOG`
/// 2. `[catalog] path` in config.toml
/// 3. `<home>/data_models.json`
pub fn resolve_catalog_path(flag: Option<&Path>, config: &MagicConfig, home: &Path) -> (PathBuf, CatalogSource) {
    if let Some(path) = flag {
        return (path.to_path_buf(), CatalogSource::Flag);
    }
    if let Some(path) = &config.catalog.path {
        return (path.clone(), CatalogSource::Config);
    }
    (home.join(DEFAULT_CATALOG_FILE), CatalogSource::Default)
}

/// Load and validate the catalog at `path`
pub fn load_catalog(path: &Path) -> Result<SchemaCatalog, HelpfulError> {
    if !path.exists() {
        return Err(HelpfulError::catalog_not_found(path));
    }
    SchemaCatalog::load(path).map_err(|err| match err {
        CatalogError::Io(io) => HelpfulError::cannot_read_file(path, &io.to_string()),
        other => HelpfulError::invalid_catalog(path, &other.to_string()),
    })
}

/// Resolve and load the catalog for a command
pub fn open_catalog(arg: &CatalogArg, config: &MagicConfig) -> Result<SchemaCatalog, HelpfulError> {
    let (path, source) = resolve_catalog_path(arg.catalog.as_deref(), config, &magic_home());
    tracing::debug!(path = %path.display(), source = source.as_str(), "Loading schema catalog");
    load_catalog(&path)
}

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved settings in JSON format
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub catalog: CatalogArg,
}

/// Run the config command - shows resolved paths and settings
pub fn run(args: ConfigArgs, config: &MagicConfig) -> anyhow::Result<()> {
    let home = magic_home();
    let config_file = config_path();
    let (catalog, source) = resolve_catalog_path(args.catalog.catalog.as_deref(), config, &home);
    let logs = logs_dir();
    let filter = magic_logging::resolve_filter(
        std::env::var("RUST_LOG").ok().as_deref(),
        config.logging.filter.as_deref(),
    );

    if args.json {
        let resolved = serde_json::json!({
            "home": home.to_string_lossy(),
            "config_file": {
                "path": config_file.to_string_lossy(),
                "exists": config_file.exists(),
            },
            "catalog": {
                "path": catalog.to_string_lossy(),
                "source": source.as_str(),
                "exists": catalog.exists(),
            },
            "max_version": config.upgrade.max_version,
            "logs": {
                "path": logs.to_string_lossy(),
                "filter": filter,
            },
        });
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    } else {
        println!("MAGIC CONFIGURATION");
        println!("===================");
        println!();
        println!("Home:     {}", home.display());
        println!(
            "Config:   {} ({})",
            config_file.display(),
            if config_file.exists() { "exists" } else { "not found" }
        );
        println!();
        println!(
            "Catalog:  {} ({}, {})",
            catalog.display(),
            source.as_str(),
            if catalog.exists() { "exists" } else { "not found" }
        );
        println!(
            "Max version: {}",
            config.upgrade.max_version.as_deref().unwrap_or("newest")
        );
        println!();
        println!("Logs:     {}", logs.display());
        println!("Filter:   {}", filter);
    }

    Ok(())
}
