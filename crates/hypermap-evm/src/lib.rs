//! # hypermap-evm
//!
//! EVM side of the Hypermap indexer: event-signature table, ABI log
//! decoder, JSON-RPC log source and the chunked fetch/reduce pipeline.
//!
//! ## Implementation notes
//! - Uses `alloy-core` for ABI decode
//! - Topics[0] → event signature fingerprint (keccak256)
//! - Topics[1..] → indexed parameters (each 32 bytes)
//! - `data` → non-indexed parameters (ABI-encoded tuple)

pub mod builder;
pub mod decoder;
pub mod fetcher;
pub mod fingerprint;
pub mod normalizer;
pub mod pipeline;
pub mod rpc;
pub mod schema;

pub use builder::HypermapBuilder;
pub use decoder::{DecodeOutcome, EventDecoder};
pub use fetcher::{chunk_ranges, fetch_all, ChunkRanges, FetchOutcome};
pub use pipeline::{build_namespace, NamespaceBuild, Pipeline, PipelineOutput, RunStats};
pub use rpc::HttpLogSource;
pub use schema::{EventSchema, EventTable, FieldDef, FieldType};
