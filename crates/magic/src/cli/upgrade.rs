//! Upgrade command - migrate a contribution JSON file to a newer data model

use crate::cli::config::{open_catalog, CatalogArg, MagicConfig};
use crate::cli::error::HelpfulError;
use crate::cli::output::{print_contribution, print_diagnostics, summary, Report};
use crate::cli::parse::read_input;
use magic_contribution::{Contribution, Upgrader};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Arguments for the upgrade command
#[derive(Debug, clap::Args)]
pub struct UpgradeArgs {
    /// Contribution JSON file, or '-' for stdin
    pub file: PathBuf,

    /// Stop upgrading at this version
    #[arg(long)]
    pub max_version: Option<String>,

    #[command(flatten)]
    pub catalog: CatalogArg,

    /// Write the upgraded contribution JSON here instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output {contribution, errors, warnings} as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the upgrade command
pub fn run(args: UpgradeArgs, config: &MagicConfig) -> anyhow::Result<ExitCode> {
    let text = read_input(&args.file)?;
    let contribution = Contribution::from_json_str(&text)
        .map_err(|e| HelpfulError::invalid_contribution(&args.file, &e.to_string()))?;

    let catalog = open_catalog(&args.catalog, config)?;
    let max_version = args
        .max_version
        .as_deref()
        .or(config.upgrade.max_version.as_deref());

    let outcome = Upgrader::new(&catalog).upgrade(&contribution, max_version);
    let has_errors = !outcome.errors().is_empty();
    let (upgraded, diagnostics) = outcome.into_parts();
    let diagnostics = [diagnostics];

    info!(
        from = contribution.version().unwrap_or("unknown"),
        to = upgraded.version().unwrap_or("unknown"),
        "Upgraded contribution"
    );

    if let Some(path) = &args.output {
        std::fs::write(path, upgraded.to_json_pretty()?)
            .map_err(|e| HelpfulError::cannot_write_file(path, &e.to_string()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&Report::new(&upgraded, &diagnostics))?);
    } else {
        if args.output.is_none() {
            print_contribution(&upgraded);
        }
        print_diagnostics(&diagnostics);
        println!();
        println!("{}", summary(&upgraded, &diagnostics));
        if let Some(path) = &args.output {
            println!("Wrote {}", path.display());
        }
    }

    Ok(if has_errors {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}
