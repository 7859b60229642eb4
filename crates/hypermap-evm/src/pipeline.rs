//! The end-to-end run: fetch → decode → sequence → reduce → filter.

use hypermap_core::config::HypermapConfig;
use hypermap_core::entry::Namespace;
use hypermap_core::error::IndexerError;
use hypermap_core::event::RawLog;
use hypermap_core::filter::filter_resolved;
use hypermap_core::reducer::NamespaceState;
use hypermap_core::sequencer::sequence;
use hypermap_core::source::{LogSource, Progress, ProgressCallback};

use crate::decoder::EventDecoder;
use crate::fetcher::fetch_all;
use crate::schema::EventTable;

/// A progress update is emitted every this many reduced events.
pub const PROGRESS_INTERVAL: usize = 500;

/// Counters describing one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub chunks: usize,
    pub raw_logs: usize,
    pub removed_logs: usize,
    pub decoded: usize,
    pub unknown: usize,
    pub decode_failed: usize,
    pub applied: usize,
    pub skipped: usize,
    /// Entries in the reduced state, root included
    pub entries_total: usize,
    /// Entries left after filtering, root included
    pub entries_emitted: usize,
}

impl RunStats {
    /// Logs or events that never made it into the namespace.
    pub fn dropped(&self) -> usize {
        self.unknown + self.decode_failed + self.skipped
    }

    pub fn entries_filtered(&self) -> usize {
        self.entries_total.saturating_sub(self.entries_emitted)
    }
}

/// The offline half of a run.
#[derive(Debug, Clone)]
pub struct NamespaceBuild {
    pub namespace: Namespace,
    pub stats: RunStats,
}

/// Result of [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Filtered namespace, always containing the root
    pub namespace: Namespace,
    pub latest_block: u64,
    pub latest_processed: u64,
    pub stats: RunStats,
}

/// Decode, sequence, reduce and filter an already-fetched log set.
pub fn build_namespace(logs: &[RawLog], table: &EventTable) -> NamespaceBuild {
    process(logs, &EventDecoder::new(table.clone()), None)
}

fn process(
    logs: &[RawLog],
    decoder: &EventDecoder,
    progress: Option<&dyn ProgressCallback>,
) -> NamespaceBuild {
    let report = |current: usize, total: usize, message: String| {
        if let Some(cb) = progress {
            cb.on_progress(&Progress {
                current: current as u64,
                total: total as u64,
                message,
            });
        }
    };

    report(0, logs.len(), "Decoding events...".into());
    let mut outcome = decoder.decode_batch(logs);
    tracing::info!(
        raw = logs.len(),
        decoded = outcome.events.len(),
        unknown = outcome.unknown,
        failed = outcome.failed,
        "Decoded events"
    );

    report(0, outcome.events.len(), "Sorting events...".into());
    sequence(&mut outcome.events);

    let total = outcome.events.len();
    let mut state = NamespaceState::new();
    for (i, event) in outcome.events.iter().enumerate() {
        if i % PROGRESS_INTERVAL == 0 {
            report(i, total, format!("Processing state... ({i}/{total} events)"));
        }
        state.apply(event);
    }
    let reduce = state.stats();

    report(total, total, "Filtering state...".into());
    let namespace = filter_resolved(state.entries());

    let stats = RunStats {
        raw_logs: logs.len(),
        decoded: total,
        unknown: outcome.unknown,
        decode_failed: outcome.failed,
        applied: reduce.applied,
        skipped: reduce.skipped,
        entries_total: state.entries().len(),
        entries_emitted: namespace.len(),
        ..Default::default()
    };
    tracing::info!(
        entries = stats.entries_total,
        emitted = stats.entries_emitted,
        unresolved = reduce.unresolved_names,
        skipped = stats.skipped,
        "State reconstructed"
    );
    NamespaceBuild { namespace, stats }
}

/// Drives a full run against a [`LogSource`].
pub struct Pipeline<S: LogSource> {
    source: S,
    config: HypermapConfig,
    decoder: EventDecoder,
    progress: Option<Box<dyn ProgressCallback>>,
}

impl<S: LogSource> Pipeline<S> {
    pub fn new(source: S, config: HypermapConfig) -> Self {
        Self {
            source,
            config,
            decoder: EventDecoder::default(),
            progress: None,
        }
    }

    /// Decode against a custom event table instead of the built-in one.
    pub fn with_table(mut self, table: EventTable) -> Self {
        self.decoder = EventDecoder::new(table);
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressCallback + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn config(&self) -> &HypermapConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run the whole pipeline.
    ///
    /// A fetch failure aborts before any decoding; nothing partial is
    /// returned.
    pub async fn run(&self) -> Result<PipelineOutput, IndexerError> {
        self.config.validate()?;
        let progress = self.progress.as_deref();

        let fetched = fetch_all(&self.source, &self.config, progress).await?;
        let NamespaceBuild { namespace, mut stats } =
            process(&fetched.logs, &self.decoder, progress);
        stats.chunks = fetched.chunks;
        stats.removed_logs = fetched.removed;

        if let Some(cb) = progress {
            cb.on_progress(&Progress {
                current: fetched.latest_processed,
                total: fetched.latest_processed,
                message: "Done!".into(),
            });
        }

        Ok(PipelineOutput {
            namespace,
            latest_block: fetched.latest_block,
            latest_processed: fetched.latest_processed,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_set_yields_root_only() {
        let build = build_namespace(&[], &EventTable::hypermap());
        assert_eq!(build.namespace.len(), 1);
        assert_eq!(build.stats.entries_total, 1);
        assert_eq!(build.stats.entries_emitted, 1);
        assert_eq!(build.stats.dropped(), 0);
    }

    #[test]
    fn stats_derivations() {
        let stats = RunStats {
            unknown: 2,
            decode_failed: 1,
            skipped: 3,
            entries_total: 10,
            entries_emitted: 7,
            ..Default::default()
        };
        assert_eq!(stats.dropped(), 6);
        assert_eq!(stats.entries_filtered(), 3);
    }
}
