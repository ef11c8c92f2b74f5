//! MagIC contribution command-line tool
//!
//! - **parse**: Tab-delimited contribution text to tables, optionally upgraded
//! - **upgrade**: Contribution JSON migrated to a newer data model version
//! - **catalog**: Inspect data model versions and column lineage
//! - **config**: Show resolved paths and settings
//!
//! Exit status is 0 when a command succeeds with no error diagnostics and 1
//! otherwise.

mod cli;

use clap::{Parser, Subcommand};
use cli::catalog::CatalogAction;
use cli::config::{ConfigArgs, MagicConfig};
use cli::parse::ParseArgs;
use cli::upgrade::UpgradeArgs;
use magic_logging::LogConfig;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "magic", version, about = "Parse and upgrade MagIC contributions")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a tab-delimited contribution text file
    Parse(ParseArgs),

    /// Upgrade a contribution JSON file to a newer data model version
    Upgrade(UpgradeArgs),

    /// Inspect the schema catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Show configuration paths and settings
    Config(ConfigArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Parse(args) => args.json,
        Commands::Upgrade(args) => args.json,
        Commands::Catalog { action } => match action {
            CatalogAction::Versions { json, .. } => *json,
            CatalogAction::Map { json, .. } => *json,
        },
        Commands::Config(args) => args.json,
    }
}

fn run_command(command: Commands, config: &MagicConfig) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Parse(args) => cli::parse::run(args, config),
        Commands::Upgrade(args) => cli::upgrade::run(args, config),
        Commands::Catalog { action } => cli::catalog::run(action, config).map(|()| ExitCode::SUCCESS),
        Commands::Config(args) => cli::config::run(args, config).map(|()| ExitCode::SUCCESS),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    // Config is read before logging so its [logging] filter applies
    let config = cli::config::load_config(&cli::config::config_path());
    let filter = config
        .as_ref()
        .ok()
        .and_then(|c| c.logging.filter.clone());

    let _log_guard = match magic_logging::init_logging(LogConfig {
        app_name: "magic",
        verbose: cli.verbose,
        filter: filter.as_deref(),
    }) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: logging disabled: {:#}", err);
            None
        }
    };

    let result = config
        .map_err(anyhow::Error::from)
        .and_then(|config| run_command(cli.command, &config));

    match result {
        Ok(code) => code,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
