//! Writes the namespace document.

use anyhow::{Context, Result};
use hypermap_core::Namespace;
use std::path::{Path, PathBuf};

/// `hypermapState_{block}.json`
pub fn state_file_name(block: u64) -> String {
    format!("hypermapState_{block}.json")
}

/// Write `namespace` as pretty JSON into `dir`, returning the file path.
pub fn write_state(dir: &Path, block: u64, namespace: &Namespace) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    let path = dir.join(state_file_name(block));
    let json = serde_json::to_string_pretty(namespace)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
