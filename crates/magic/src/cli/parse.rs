//! Parse command - read a tab-delimited contribution file
//!
//! With `--upgrade`, the parsed contribution is also migrated to the newest
//! (or `--max-version`) data model version.

use crate::cli::config::{open_catalog, CatalogArg, MagicConfig};
use crate::cli::error::HelpfulError;
use crate::cli::output::{print_contribution, print_diagnostics, summary, Report};
use magic_contribution::{ingest_into, DiagnosticsSink, OperationId, SchemaCatalog};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// Arguments for the parse command
#[derive(Debug, clap::Args)]
pub struct ParseArgs {
    /// Contribution text file, or '-' for stdin
    pub file: PathBuf,

    /// Upgrade the parsed contribution using the schema catalog
    #[arg(long)]
    pub upgrade: bool,

    /// Stop upgrading at this version (implies --upgrade)
    #[arg(long)]
    pub max_version: Option<String>,

    #[command(flatten)]
    pub catalog: CatalogArg,

    /// Output {contribution, errors, warnings} as JSON
    #[arg(long)]
    pub json: bool,
}

/// Read text input from a path or stdin
pub fn read_input(path: &Path) -> Result<String, HelpfulError> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| HelpfulError::cannot_read_file(path, &e.to_string()))?;
        return Ok(text);
    }

    if !path.exists() {
        return Err(HelpfulError::file_not_found(path));
    }
    std::fs::read_to_string(path).map_err(|e| HelpfulError::cannot_read_file(path, &e.to_string()))
}

/// Run the parse command
pub fn run(args: ParseArgs, config: &MagicConfig) -> anyhow::Result<ExitCode> {
    let text = read_input(&args.file)?;

    let catalog: Option<SchemaCatalog> = if args.upgrade || args.max_version.is_some() {
        Some(open_catalog(&args.catalog, config)?)
    } else {
        None
    };
    let max_version = args
        .max_version
        .as_deref()
        .or(config.upgrade.max_version.as_deref());

    let mut sink = DiagnosticsSink::new();
    let contribution = ingest_into(&mut sink, &text, catalog.as_ref(), max_version);
    let diagnostics = [
        sink.diagnostics(&OperationId::parse_contribution()),
        sink.diagnostics(&OperationId::upgrade_contribution()),
    ];

    info!(
        file = %args.file.display(),
        tables = contribution.len(),
        version = contribution.version().unwrap_or("unknown"),
        "Parsed contribution"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&Report::new(&contribution, &diagnostics))?);
    } else {
        print_contribution(&contribution);
        print_diagnostics(&diagnostics);
        println!();
        println!("{}", summary(&contribution, &diagnostics));
    }

    Ok(if sink.has_errors() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_input_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_input(&dir.path().join("nope.txt")).unwrap_err();
        assert!(err.message.starts_with("File not found"));
    }

    #[test]
    fn test_read_input_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contribution.txt");
        std::fs::write(&path, "tab\tsites\nsite\nak01\n").unwrap();
        assert_eq!(read_input(&path).unwrap(), "tab\tsites\nsite\nak01\n");
    }
}
