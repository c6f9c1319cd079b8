use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Boreas climate-index calculator.
#[derive(Parser)]
#[command(
    name = "boreas",
    version,
    about = "Tiled climate-index computation over gridded datasets"
)]
pub struct Cli {
    /// Increase verbosity (-v library detail, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Compute one climate index from NetCDF inputs.
    Compute(ComputeArgs),
}

/// Arguments for the `compute` subcommand.
#[derive(clap::Args)]
pub struct ComputeArgs {
    /// Path to TOML run file.
    #[arg(short, long, default_value = "boreas.toml")]
    pub config: PathBuf,

    /// Override output JSON path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the built-in index name from config.
    #[arg(short, long)]
    pub index: Option<String>,

    /// Override the per-tile transfer limit in megabytes.
    #[arg(long = "memory-mb")]
    pub memory_mb: Option<f64>,

    /// Write indented JSON.
    #[arg(long)]
    pub pretty: bool,
}
