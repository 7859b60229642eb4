//! Chunked log fetching.
//!
//! The head is resolved once; `[from_block, head]` is then walked in
//! ascending, non-overlapping chunks, one request in flight at a time,
//! with a fixed pause after every chunk.

use hypermap_core::config::HypermapConfig;
use hypermap_core::error::FetchError;
use hypermap_core::event::RawLog;
use hypermap_core::source::{LogSource, Progress, ProgressCallback};

/// Everything gathered by one [`fetch_all`] call.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Fetched logs in chunk order, `removed` logs excluded
    pub logs: Vec<RawLog>,
    /// Chain head reported at the start of the run
    pub latest_block: u64,
    /// Highest block whose chunk was fully fetched
    pub latest_processed: u64,
    /// Number of chunk requests issued
    pub chunks: usize,
    /// Logs skipped because the node flagged them as removed
    pub removed: usize,
}

/// Lazily splits `[from, to]` into inclusive ranges of at most `size` blocks.
#[derive(Debug, Clone)]
pub struct ChunkRanges {
    next: Option<u64>,
    to: u64,
    size: u64,
}

impl Iterator for ChunkRanges {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<(u64, u64)> {
        let start = self.next.filter(|s| *s <= self.to)?;
        let end = start.saturating_add(self.size - 1).min(self.to);
        self.next = end.checked_add(1);
        Some((start, end))
    }
}

/// Chunk `[from, to]`; an empty iterator when `from > to`.
pub fn chunk_ranges(from: u64, to: u64, size: u64) -> ChunkRanges {
    ChunkRanges {
        next: Some(from),
        to,
        size: size.max(1),
    }
}

/// Fetch every log from `config.from_block` up to the head (or
/// `config.to_block` if lower).
///
/// Aborts on the first failed chunk; nothing fetched so far is returned.
pub async fn fetch_all<S>(
    source: &S,
    config: &HypermapConfig,
    progress: Option<&dyn ProgressCallback>,
) -> Result<FetchOutcome, FetchError>
where
    S: LogSource + ?Sized,
{
    let report = |current: u64, total: u64, message: String| {
        if let Some(cb) = progress {
            cb.on_progress(&Progress {
                current,
                total,
                message,
            });
        }
    };

    report(0, 0, "Fetching latest block...".into());
    let latest_block = source.latest_block().await?;
    let target = config.to_block.map_or(latest_block, |to| to.min(latest_block));
    tracing::info!(
        from = config.from_block,
        to = target,
        head = latest_block,
        chunk_size = config.chunk_size,
        "Starting log fetch"
    );

    let mut outcome = FetchOutcome {
        latest_block,
        latest_processed: config.from_block.saturating_sub(1),
        ..Default::default()
    };
    let delay = config.chunk_delay();

    for (from, to) in chunk_ranges(config.from_block, target, config.chunk_size) {
        report(to, target, format!("Processing blocks {from} - {to}"));

        let logs = source
            .fetch_range(from, to)
            .await
            .map_err(|e| {
                tracing::error!(from, to, error = %e, "Chunk fetch failed, aborting run");
                FetchError::Range {
                    from,
                    to,
                    reason: e.to_string(),
                }
            })?;

        let fetched = logs.len();
        for log in logs {
            if log.is_removed() {
                tracing::debug!(
                    block = log.block_number,
                    log_index = log.log_index,
                    "Skipping removed log"
                );
                outcome.removed += 1;
            } else {
                outcome.logs.push(log);
            }
        }
        outcome.chunks += 1;
        outcome.latest_processed = to;
        tracing::debug!(from, to, fetched, total = outcome.logs.len(), "Chunk fetched");

        tokio::time::sleep(delay).await;
    }

    tracing::info!(
        logs = outcome.logs.len(),
        chunks = outcome.chunks,
        latest_processed = outcome.latest_processed,
        "Log fetch complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hypermap_core::source::MemoryLogSource;
    use std::sync::Mutex;

    fn log_at(block: u64, removed: Option<bool>) -> RawLog {
        RawLog {
            address: "0x0".into(),
            topics: vec![],
            data: vec![],
            block_number: block,
            transaction_hash: format!("0x{block:x}"),
            log_index: 0,
            removed,
        }
    }

    fn config(from: u64, chunk: u64) -> HypermapConfig {
        HypermapConfig {
            from_block: from,
            chunk_size: chunk,
            chunk_delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn chunk_ranges_cover_interval() {
        let ranges: Vec<_> = chunk_ranges(0, 9, 4).collect();
        assert_eq!(ranges, vec![(0, 3), (4, 7), (8, 9)]);
        assert_eq!(chunk_ranges(5, 5, 100).collect::<Vec<_>>(), vec![(5, 5)]);
        assert_eq!(chunk_ranges(10, 9, 4).count(), 0);
    }

    #[test]
    fn chunk_ranges_are_lazy_and_stop_at_max() {
        let first: Vec<_> = chunk_ranges(0, u64::MAX, 1).take(3).collect();
        assert_eq!(first, vec![(0, 0), (1, 1), (2, 2)]);
        let tail: Vec<_> = chunk_ranges(u64::MAX - 1, u64::MAX, 10).collect();
        assert_eq!(tail, vec![(u64::MAX - 1, u64::MAX)]);
    }

    #[tokio::test]
    async fn fetches_in_ascending_chunks() {
        let source = MemoryLogSource::new(vec![log_at(3, None), log_at(12, None)], 25);
        let outcome = fetch_all(&source, &config(0, 10), None).await.unwrap();
        assert_eq!(source.calls(), vec![(0, 9), (10, 19), (20, 25)]);
        assert_eq!(outcome.logs.len(), 2);
        assert_eq!(outcome.chunks, 3);
        assert_eq!(outcome.latest_block, 25);
        assert_eq!(outcome.latest_processed, 25);
    }

    #[tokio::test]
    async fn to_block_caps_range() {
        let source = MemoryLogSource::new(vec![], 1_000);
        let mut cfg = config(0, 10);
        cfg.to_block = Some(14);
        let outcome = fetch_all(&source, &cfg, None).await.unwrap();
        assert_eq!(source.calls(), vec![(0, 9), (10, 14)]);
        assert_eq!(outcome.latest_processed, 14);
        assert_eq!(outcome.latest_block, 1_000);
    }

    #[tokio::test]
    async fn removed_logs_are_skipped() {
        let source = MemoryLogSource::new(vec![log_at(1, Some(true)), log_at(2, Some(false))], 5);
        let outcome = fetch_all(&source, &config(0, 10), None).await.unwrap();
        assert_eq!(outcome.logs.len(), 1);
        assert_eq!(outcome.removed, 1);
    }

    #[tokio::test]
    async fn start_past_head_fetches_nothing() {
        let source = MemoryLogSource::new(vec![], 5);
        let outcome = fetch_all(&source, &config(10, 10), None).await.unwrap();
        assert!(source.calls().is_empty());
        assert_eq!(outcome.latest_processed, 9);
    }

    struct FailingSource {
        fail_from: u64,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl LogSource for FailingSource {
        async fn latest_block(&self) -> Result<u64, FetchError> {
            Ok(100)
        }

        async fn fetch_range(&self, from: u64, _to: u64) -> Result<Vec<RawLog>, FetchError> {
            *self.calls.lock().unwrap() += 1;
            if from >= self.fail_from {
                Err(FetchError::Http("connection reset".into()))
            } else {
                Ok(vec![])
            }
        }
    }

    #[tokio::test]
    async fn aborts_on_first_failure() {
        let source = FailingSource {
            fail_from: 20,
            calls: Mutex::new(0),
        };
        let err = fetch_all(&source, &config(0, 10), None).await.unwrap_err();
        match err {
            FetchError::Range { from, to, reason } => {
                assert_eq!((from, to), (20, 29));
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(*source.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn reports_progress() {
        let source = MemoryLogSource::new(vec![], 15);
        let seen = Mutex::new(Vec::new());
        let cb = |p: &Progress| seen.lock().unwrap().push(p.message.clone());
        fetch_all(&source, &config(0, 10), Some(&cb)).await.unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(
            seen,
            vec![
                "Fetching latest block...".to_string(),
                "Processing blocks 0 - 9".to_string(),
                "Processing blocks 10 - 15".to_string(),
            ]
        );
    }
}
