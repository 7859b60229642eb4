//! The chunked log source contract and progress reporting hooks.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::FetchError;
use crate::event::RawLog;

/// Supplies raw logs for block ranges.
///
/// The orchestrator calls `latest_block` once per run, then `fetch_range`
/// over ascending, non-overlapping chunks, one request in flight at a time.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// The chain head at the time of the call.
    async fn latest_block(&self) -> Result<u64, FetchError>;

    /// All logs in `[from, to]` (inclusive).
    async fn fetch_range(&self, from: u64, to: u64) -> Result<Vec<RawLog>, FetchError>;
}

/// A progress update emitted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub message: String,
}

/// Receives progress updates during a run.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, progress: &Progress);
}

/// Blanket impl so closures can be used as progress callbacks.
impl<F: Fn(&Progress) + Send + Sync> ProgressCallback for F {
    fn on_progress(&self, progress: &Progress) {
        self(progress)
    }
}

/// An in-memory log source over a fixed log set.
///
/// Records every requested range, which makes chunking observable in tests.
pub struct MemoryLogSource {
    logs: Vec<RawLog>,
    head: u64,
    calls: Mutex<Vec<(u64, u64)>>,
}

impl MemoryLogSource {
    pub fn new(logs: Vec<RawLog>, head: u64) -> Self {
        Self {
            logs,
            head,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Ranges requested so far, in call order.
    pub fn calls(&self) -> Vec<(u64, u64)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LogSource for MemoryLogSource {
    async fn latest_block(&self) -> Result<u64, FetchError> {
        Ok(self.head)
    }

    async fn fetch_range(&self, from: u64, to: u64) -> Result<Vec<RawLog>, FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((from, to));
        }
        Ok(self
            .logs
            .iter()
            .filter(|log| (from..=to).contains(&log.block_number))
            .cloned()
            .collect())
    }
}
