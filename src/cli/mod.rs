//! Command-line interface for repo-picker
//!
//! Provides `export`, `branches`, and `recent` subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod branches;
mod export;
mod recent;
mod utils;

/// Browse a remote repository, pick files, and bundle them into one
/// prompt-ready context document
#[derive(Parser)]
#[command(name = "repo-picker")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export selected files from a repository branch as one document
    Export(Box<export::ExportArgs>),

    /// List a repository's branches with their latest commit
    Branches(branches::BranchesArgs),

    /// Show or clear the recent-repository list
    Recent(recent::RecentArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Export(args) => runtime.block_on(export::run(*args)),
        Commands::Branches(args) => runtime.block_on(branches::run(args)),
        Commands::Recent(args) => recent::run(args),
    }
}
