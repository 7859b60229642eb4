//! # hypermap-observability
//!
//! Logging and metrics for Hypermap indexer runs.
//!
//! ## Built-in metrics
//! - `hypermap.logs_fetched`: raw logs returned by the log source
//! - `hypermap.events_decoded`: logs decoded into Hypermap events
//! - `hypermap.events_dropped`: unknown, undecodable or skipped events
//! - `hypermap.entries_emitted`: entries in the filtered namespace
//! - `hypermap.entries_filtered`: entries removed by the post-filter

pub mod metrics;
pub mod tracing_setup;

pub use metrics::HypermapMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
