//! Hypermap CLI: rebuild the Hypermap namespace from contract logs.
//!
//! # Commands
//! ```text
//! hypermap build   --rpc <url> [--from-block N] [--to-block N] [--output <dir>]
//! hypermap replay  --logs <logs.json> [--output <dir>]
//! hypermap events  [--abi <abi.json>] [--json]
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use hypermap_observability::init_tracing;
use std::path::PathBuf;

mod cmd_build;
mod cmd_events;
mod cmd_replay;
mod config;
mod output;

#[derive(Parser)]
#[command(
    name = "hypermap",
    about = "Hypermap namespace indexer",
    long_about = "
Rebuilds the Hypermap namespace (names, owners, notes, facts) from the
Hypermap contract's event logs and writes it as a JSON document.

ENVIRONMENT VARIABLES:
  HYPERMAP_RPC_URL    JSON-RPC endpoint used by `build`
  RUST_LOG            Overrides the log filter
",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// YAML config file (indexer and log sections)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch logs over JSON-RPC and write the namespace state
    Build(cmd_build::BuildArgs),

    /// Rebuild the namespace state from a saved log file
    Replay {
        /// JSON array of logs in `eth_getLogs` shape
        #[arg(short, long)]
        logs: PathBuf,
        /// Contract ABI JSON to take the event table from
        #[arg(long)]
        abi: Option<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// List the event table with signatures and fingerprints
    Events {
        /// Contract ABI JSON to take the event table from
        #[arg(long)]
        abi: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = config::load(cli.config.as_deref())?;
    let mut log = file_config.log.clone();
    if cli.verbose {
        log.level = "debug".into();
    }
    log.json |= cli.json_logs;
    init_tracing(&log);

    match cli.command {
        Commands::Build(args) => cmd_build::run(args, file_config).await,
        Commands::Replay { logs, abi, output } => {
            cmd_replay::run(&logs, abi.as_deref(), &output)
        }
        Commands::Events { abi, json } => cmd_events::run(abi.as_deref(), json),
    }
}
