//! # hypermap-core
//!
//! Namespace model and state reconstruction for the Hypermap indexer.
//!
//! ```text
//! LogSource ─► (decoder, in hypermap-evm) ─► sequencer ─► NamespaceState ─► filter
//!                                                            │
//!                                              interpret (note/fact payloads)
//! ```
//!
//! Everything here is chain-transport agnostic: the crate consumes decoded
//! events and produces a [`Namespace`] keyed by [`Namehash`].

pub mod config;
pub mod entry;
pub mod error;
pub mod event;
pub mod filter;
pub mod hash;
pub mod interpret;
pub mod reducer;
pub mod sequencer;
pub mod serde_hex;
pub mod source;

pub use config::HypermapConfig;
pub use entry::{Entry, Namespace, Record};
pub use error::{DecodeError, EventError, FetchError, IndexerError};
pub use event::{DecodedEvent, EventKind, ParamValue, RawLog};
pub use filter::filter_resolved;
pub use hash::{Namehash, ZERO_ADDRESS};
pub use interpret::{interpret, NoteValue};
pub use reducer::{NameResolution, NamespaceState, ReduceStats};
pub use sequencer::{sequence, sequenced};
pub use source::{LogSource, MemoryLogSource, Progress, ProgressCallback};
