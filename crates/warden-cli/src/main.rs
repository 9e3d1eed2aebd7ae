//! Warden CLI
//!
//! Operator tooling for the access-window engine: inspect valid ranges and
//! mask query results against a fixture world.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{
    check::{self, CheckArgs},
    mask::{self, MaskArgs, MaskMetadataArgs},
    ranges::{self, RangesArgs},
    Session,
};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Warden - Access Windows for Archived Data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "warden.toml")]
    config: PathBuf,

    /// Fixture world, overriding the config file
    #[arg(short, long, global = true)]
    fixture: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the valid-range set for a principal on a resource
    Ranges(RangesArgs),

    /// Mask a JSON file of time-series records
    Mask(MaskArgs),

    /// Mask a JSON file of metadata groups
    MaskMetadata(MaskMetadataArgs),

    /// Check whether access was held at one instant (exit 1 if denied)
    Check(CheckArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::load(&cli.config)?;
    let session = Session::open(&config, cli.fixture)?;

    match cli.command {
        Commands::Ranges(args) => ranges::run(&session, args).await?,
        Commands::Mask(args) => mask::run_timeseries(&session, args).await?,
        Commands::MaskMetadata(args) => mask::run_metadata(&session, args).await?,
        Commands::Check(args) => {
            if !check::run(&session, args).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
