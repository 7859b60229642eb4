//! `hypermap build`: fetch logs over JSON-RPC and write the namespace.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use hypermap_core::Progress;
use hypermap_evm::{EventTable, HypermapBuilder};
use hypermap_observability::HypermapMetrics;
use std::path::PathBuf;

use crate::config::FileConfig;
use crate::output;

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// JSON-RPC endpoint
    #[arg(long, env = "HYPERMAP_RPC_URL")]
    pub rpc: Option<String>,
    /// Hypermap contract address
    #[arg(long)]
    pub contract: Option<String>,
    /// First block to fetch
    #[arg(long)]
    pub from_block: Option<u64>,
    /// Last block to fetch (default: chain head)
    #[arg(long)]
    pub to_block: Option<u64>,
    /// Blocks per eth_getLogs request
    #[arg(long)]
    pub chunk_size: Option<u64>,
    /// Pause after every chunk, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
    /// Contract ABI JSON to take the event table from
    #[arg(long)]
    pub abi: Option<PathBuf>,
    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

pub async fn run(args: BuildArgs, file: FileConfig) -> Result<()> {
    let rpc_url = args
        .rpc
        .or(file.rpc_url)
        .ok_or_else(|| anyhow!("no RPC endpoint: pass --rpc, set HYPERMAP_RPC_URL or rpc_url in the config file"))?;

    let mut config = file.indexer;
    if let Some(contract) = args.contract {
        config.contract_address = contract;
    }
    if let Some(from) = args.from_block {
        config.from_block = from;
    }
    if args.to_block.is_some() {
        config.to_block = args.to_block;
    }
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    if let Some(ms) = args.delay_ms {
        config.chunk_delay_ms = ms;
    }

    let mut builder = HypermapBuilder::from_config(config);
    if let Some(path) = &args.abi {
        builder = builder.event_table(load_table(path)?);
    }

    tracing::info!(rpc = %rpc_url, "Building Hypermap state");
    let pipeline = builder
        .build_http(rpc_url)?
        .with_progress(|p: &Progress| {
            tracing::info!(current = p.current, total = p.total, "{}", p.message);
        });

    let out = pipeline.run().await.context("indexing run failed")?;
    HypermapMetrics::global().record_run("rpc", &out.stats);

    let path = output::write_state(&args.output, out.latest_processed, &out.namespace)?;
    tracing::info!(
        path = %path.display(),
        entries = out.stats.entries_emitted,
        dropped = out.stats.dropped(),
        latest_block = out.latest_block,
        "State written"
    );
    println!("{}", path.display());
    Ok(())
}

pub fn load_table(path: &std::path::Path) -> Result<EventTable> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading ABI {}", path.display()))?;
    EventTable::from_json_abi(&json).with_context(|| format!("loading events from {}", path.display()))
}
