use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{cache, names, scenario};

/// Monet Command Line Interface
///
/// Inspect capability names, render preference headers and run
/// reconciliation passes over scenario files.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check capability names against the name grammar
    Validate {
        /// Names to check
        #[clap(required = true)]
        names: Vec<String>,
    },

    /// Render an Accept-Monetization header from allow and deny lists
    Header {
        /// Allowed capability patterns, most preferred first
        #[clap(long)]
        allow: Vec<String>,

        /// Denied capability patterns
        #[clap(long)]
        deny: Vec<String>,
    },

    /// Reconcile the capabilities declared in a scenario file
    #[clap(name = "match")]
    Match {
        /// Path to the scenario file (TOML or JSON)
        #[clap(long)]
        scenario: PathBuf,

        /// Ignore cached results and re-run every detection
        #[clap(long)]
        bypass_cache: bool,

        /// Path to the runtime configuration file
        #[clap(long)]
        config: Option<PathBuf>,
    },

    /// Delete every cached detection result
    #[clap(name = "clear-cache")]
    ClearCache {
        /// Path to the runtime configuration file
        #[clap(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { names } => Ok(names::execute_validate(&names)),
        Commands::Header { allow, deny } => {
            names::execute_header(&allow, &deny)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Match {
            scenario,
            bypass_cache,
            config,
        } => {
            scenario::execute_match(&scenario, bypass_cache, config.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::ClearCache { config } => {
            cache::execute_clear_cache(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
