//! Error types for the Hypermap indexing pipeline.
//!
//! Only [`FetchError`] is allowed to terminate a run. Every other class is
//! recovered where it happens: the offending log or event is dropped with a
//! diagnostic and the pipeline carries on.

use thiserror::Error;

/// A chunk fetch against the log source failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Failed to fetch logs in range {from}-{to}: {reason}")]
    Range { from: u64, to: u64, reason: String },
}

/// A single raw log could not be decoded into a [`DecodedEvent`](crate::event::DecodedEvent).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid topic {topic}: {reason}")]
    InvalidTopic { topic: String, reason: String },

    #[error("ABI decode failed: {reason}")]
    AbiDecodeFailed { reason: String },

    #[error("Unsupported ABI type '{ty}'")]
    UnsupportedType { ty: String },

    #[error("Invalid contract ABI: {reason}")]
    InvalidAbi { reason: String },
}

/// The reducer could not apply one decoded event.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Missing parameter '{name}'")]
    MissingParam { name: String },

    #[error("Parameter '{name}' has wrong type: expected {expected}")]
    WrongType { name: String, expected: &'static str },

    #[error("Malformed token id '{id}': {reason}")]
    MalformedTokenId { id: String, reason: String },
}

/// Top-level error surfaced to callers of the pipeline.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl IndexerError {
    /// Returns `true` if the run was aborted by the log source.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}
