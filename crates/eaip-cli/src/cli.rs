use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "eaip",
    about = "eAIP document version history: snapshots, comparisons and restore",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the history server
    Serve(ServeArgs),
    /// Show changes between two document content files
    Diff(DiffArgs),
    /// Check that a document content file encodes losslessly
    Check(CheckArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Overrides `bind_addr` from the configuration
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    pub file: PathBuf,
}
