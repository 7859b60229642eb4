//! Hypermap run metrics.
//!
//! Counters follow OpenTelemetry conventions and go to whatever meter
//! provider the host application installed globally (a no-op by default).

use hypermap_evm::RunStats;
use opentelemetry::{
    metrics::{Counter, Meter},
    KeyValue,
};

/// Central metrics handle for indexer runs.
#[derive(Clone)]
pub struct HypermapMetrics {
    pub logs_fetched: Counter<u64>,
    pub events_decoded: Counter<u64>,
    pub events_dropped: Counter<u64>,
    pub entries_emitted: Counter<u64>,
    pub entries_filtered: Counter<u64>,
}

impl HypermapMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            logs_fetched: meter
                .u64_counter("hypermap.logs_fetched")
                .with_description("Raw logs returned by the log source")
                .build(),
            events_decoded: meter
                .u64_counter("hypermap.events_decoded")
                .with_description("Logs decoded into Hypermap events")
                .build(),
            events_dropped: meter
                .u64_counter("hypermap.events_dropped")
                .with_description("Logs or events that did not reach the namespace")
                .build(),
            entries_emitted: meter
                .u64_counter("hypermap.entries_emitted")
                .with_description("Entries in the filtered namespace")
                .build(),
            entries_filtered: meter
                .u64_counter("hypermap.entries_filtered")
                .with_description("Entries dropped for an unresolved full name")
                .build(),
        }
    }

    /// Metrics bound to the global `hypermap` meter.
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("hypermap"))
    }

    /// Record the counters of one finished run, tagged with its mode
    /// (`"rpc"` or `"replay"`).
    pub fn record_run(&self, mode: &str, stats: &RunStats) {
        let attrs = [KeyValue::new("mode", mode.to_string())];
        self.logs_fetched.add(stats.raw_logs as u64, &attrs);
        self.events_decoded.add(stats.decoded as u64, &attrs);
        self.events_dropped.add(stats.dropped() as u64, &attrs);
        self.entries_emitted.add(stats.entries_emitted as u64, &attrs);
        self.entries_filtered.add(stats.entries_filtered() as u64, &attrs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_run_against_noop_meter() {
        let metrics = HypermapMetrics::global();
        let stats = RunStats {
            raw_logs: 10,
            decoded: 8,
            unknown: 2,
            entries_total: 5,
            entries_emitted: 4,
            ..Default::default()
        };
        metrics.record_run("replay", &stats);
    }
}
