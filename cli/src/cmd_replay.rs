//! `hypermap replay`: rebuild state from a saved log file, no network.

use anyhow::{Context, Result};
use hypermap_core::RawLog;
use hypermap_evm::{build_namespace, EventTable};
use hypermap_observability::HypermapMetrics;
use std::path::Path;

use crate::{cmd_build::load_table, output};

pub fn run(logs_path: &Path, abi: Option<&Path>, out_dir: &Path) -> Result<()> {
    let text = std::fs::read_to_string(logs_path)
        .with_context(|| format!("reading {}", logs_path.display()))?;
    let logs: Vec<RawLog> = serde_json::from_str(&text)
        .with_context(|| format!("parsing logs from {}", logs_path.display()))?;
    let logs: Vec<RawLog> = logs.into_iter().filter(|l| !l.is_removed()).collect();

    let table = match abi {
        Some(path) => load_table(path)?,
        None => EventTable::hypermap(),
    };

    tracing::info!(logs = logs.len(), "Replaying saved logs");
    let build = build_namespace(&logs, &table);
    HypermapMetrics::global().record_run("replay", &build.stats);

    let latest = logs.iter().map(|l| l.block_number).max().unwrap_or(0);
    let path = output::write_state(out_dir, latest, &build.namespace)?;
    tracing::info!(
        path = %path.display(),
        entries = build.stats.entries_emitted,
        dropped = build.stats.dropped(),
        "State written"
    );
    println!("{}", path.display());
    Ok(())
}
