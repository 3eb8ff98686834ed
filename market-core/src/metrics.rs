//! Counters describing what the engine produced and what was lost on the way to storage.
//!
//! Persistence is best-effort, so dropped observations are expected under store failure.
//! These counters make that loss observable without scraping logs.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct EngineMetrics {
    ticks: AtomicU64,
    observations_emitted: AtomicU64,
    observations_persisted: AtomicU64,
    observations_dropped: AtomicU64,
    batches_failed: AtomicU64,
    instruments_skipped: AtomicU64,
}

/// A point-in-time copy of `EngineMetrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub observations_emitted: u64,
    pub observations_persisted: u64,
    pub observations_dropped: u64,
    pub batches_failed: u64,
    pub instruments_skipped: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_tick(&self, emitted: usize, skipped: usize) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.observations_emitted
            .fetch_add(emitted as u64, Ordering::Relaxed);
        self.instruments_skipped
            .fetch_add(skipped as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_persisted(&self, written: usize, failed: usize) {
        self.observations_persisted
            .fetch_add(written as u64, Ordering::Relaxed);
        self.observations_dropped
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_batch_failure(&self, dropped: usize) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.observations_dropped
            .fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            observations_emitted: self.observations_emitted.load(Ordering::Relaxed),
            observations_persisted: self.observations_persisted.load(Ordering::Relaxed),
            observations_dropped: self.observations_dropped.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            instruments_skipped: self.instruments_skipped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_accumulates() {
        let metrics = EngineMetrics::new();
        metrics.record_tick(3, 1);
        metrics.record_tick(4, 0);
        metrics.record_persisted(6, 1);
        metrics.record_batch_failure(4);

        let snap = metrics.snapshot();
        assert_eq!(snap.ticks, 2);
        assert_eq!(snap.observations_emitted, 7);
        assert_eq!(snap.instruments_skipped, 1);
        assert_eq!(snap.observations_persisted, 6);
        assert_eq!(snap.observations_dropped, 5);
        assert_eq!(snap.batches_failed, 1);
    }
}
