//! The YAML config file.
//!
//! ```yaml
//! rpc_url: https://mainnet.base.org
//! indexer:
//!   from_block: 27270000
//!   chunk_size: 20000
//!   chunk_delay_ms: 1000
//! log:
//!   level: info
//!   components:
//!     hypermap-evm: debug
//! ```

use anyhow::{Context, Result};
use hypermap_core::HypermapConfig;
use hypermap_observability::LogConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub indexer: HypermapConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Load the config file, or defaults when no path is given.
pub fn load(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse(yaml: &str) -> Result<FileConfig> {
    Ok(serde_yaml::from_str(yaml)?)
}
