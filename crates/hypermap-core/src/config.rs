//! Indexer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::IndexerError;

/// The deployed Hypermap proxy contract on Base.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x000000000044C6B8Cb4d8f0F889a3E47664EAeda";
/// First block of the Hypermap deployment.
pub const DEFAULT_START_BLOCK: u64 = 27_270_000;
pub const DEFAULT_CHUNK_SIZE: u64 = 20_000;
pub const DEFAULT_CHUNK_DELAY_MS: u64 = 1_000;

/// Configuration for one indexing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HypermapConfig {
    /// Contract whose logs are fetched.
    pub contract_address: String,
    /// First block to fetch (inclusive).
    pub from_block: u64,
    /// Last block to fetch (inclusive). `None` = the head at run start.
    pub to_block: Option<u64>,
    /// Blocks per `eth_getLogs` request.
    pub chunk_size: u64,
    /// Pause after every chunk, in milliseconds.
    pub chunk_delay_ms: u64,
}

impl Default for HypermapConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS.into(),
            from_block: DEFAULT_START_BLOCK,
            to_block: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay_ms: DEFAULT_CHUNK_DELAY_MS,
        }
    }
}

impl HypermapConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    /// Reject configurations the fetch loop cannot run with.
    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.chunk_size == 0 {
            return Err(IndexerError::Config {
                reason: "chunk_size must be > 0".into(),
            });
        }
        if self.contract_address.trim().is_empty() {
            return Err(IndexerError::Config {
                reason: "contract_address is empty".into(),
            });
        }
        if let Some(to) = self.to_block {
            if to < self.from_block {
                return Err(IndexerError::Config {
                    reason: format!("to_block {to} is before from_block {}", self.from_block),
                });
            }
        }
        Ok(())
    }
}
