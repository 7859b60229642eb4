//! Fluent builder API for Hypermap runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use hypermap_evm::HypermapBuilder;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = HypermapBuilder::new()
//!     .from_block(27_270_000)
//!     .chunk_size(10_000)
//!     .chunk_delay_ms(500)
//!     .build_http("https://mainnet.base.org")?;
//! let output = pipeline.run().await?;
//! println!("{} entries", output.namespace.len());
//! # Ok(())
//! # }
//! ```

use hypermap_core::config::HypermapConfig;
use hypermap_core::error::IndexerError;
use hypermap_core::source::LogSource;

use crate::pipeline::Pipeline;
use crate::rpc::HttpLogSource;
use crate::schema::EventTable;

/// Fluent builder for [`HypermapConfig`] and [`Pipeline`].
#[derive(Default)]
pub struct HypermapBuilder {
    config: HypermapConfig,
    table: Option<EventTable>,
}

impl HypermapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing config (e.g. one loaded from YAML).
    pub fn from_config(config: HypermapConfig) -> Self {
        Self {
            config,
            table: None,
        }
    }

    /// Set the Hypermap contract address.
    pub fn contract(mut self, address: impl Into<String>) -> Self {
        self.config.contract_address = address.into();
        self
    }

    /// Set the start block.
    pub fn from_block(mut self, block: u64) -> Self {
        self.config.from_block = block;
        self
    }

    /// Stop at this block instead of the chain head.
    pub fn to_block(mut self, block: u64) -> Self {
        self.config.to_block = Some(block);
        self
    }

    /// Set the number of blocks per `eth_getLogs` request.
    pub fn chunk_size(mut self, size: u64) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the pause after every chunk, in milliseconds.
    pub fn chunk_delay_ms(mut self, ms: u64) -> Self {
        self.config.chunk_delay_ms = ms;
        self
    }

    /// Decode against a custom event table.
    pub fn event_table(mut self, table: EventTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Build the `HypermapConfig`.
    pub fn build_config(self) -> HypermapConfig {
        self.config
    }

    /// Validate the config and wire it to `source`.
    pub fn build<S: LogSource>(self, source: S) -> Result<Pipeline<S>, IndexerError> {
        self.config.validate()?;
        let pipeline = Pipeline::new(source, self.config);
        Ok(match self.table {
            Some(table) => pipeline.with_table(table),
            None => pipeline,
        })
    }

    /// Build a pipeline reading from a JSON-RPC endpoint.
    pub fn build_http(self, rpc_url: impl Into<String>) -> Result<Pipeline<HttpLogSource>, IndexerError> {
        let source = HttpLogSource::new(rpc_url, self.config.contract_address.clone())?;
        self.build(source)
    }
}
