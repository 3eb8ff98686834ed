//! Hands each tick's observations to the time-series store.
//!
//! Writes are fire-and-forget relative to the tick loop: `submit` spawns the write and
//! returns immediately, so a slow store never delays the next tick. A failed write is
//! logged and counted, never retried. At most `max_pending` writes are outstanding; a
//! batch arriving beyond that is dropped. On shutdown, writes still pending after the
//! drain timeout are aborted and their observations counted as dropped.

use crate::configuration::{DEFAULT_MAX_PENDING_WRITES, DEFAULT_SHUTDOWN_DRAIN};
use crate::metrics::EngineMetrics;
use log::{debug, error, warn};
use market::{AppendReport, ObservationBatch, ObservationStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time;

pub struct ObservationSink {
    store: Arc<dyn ObservationStore>,
    metrics: Arc<EngineMetrics>,
    in_flight: JoinSet<()>,
    /// Batch size of every write still in `in_flight`.
    pending: HashMap<Id, usize>,
    max_pending: usize,
    drain_timeout: Duration,
}

impl ObservationSink {
    pub fn new(store: Arc<dyn ObservationStore>, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            store,
            metrics,
            in_flight: JoinSet::new(),
            pending: HashMap::new(),
            max_pending: DEFAULT_MAX_PENDING_WRITES,
            drain_timeout: DEFAULT_SHUTDOWN_DRAIN,
        }
    }

    /// Caps the number of outstanding writes. Zero is treated as one.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending.max(1);
        self
    }

    /// How long `drain` waits before abandoning outstanding writes.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Starts persisting `batch` in the background. Empty batches are ignored.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, batch: ObservationBatch) {
        self.reap_finished();

        if batch.is_empty() {
            return;
        }

        if self.in_flight.len() >= self.max_pending {
            self.metrics.record_batch_failure(batch.len());
            error!(
                "Dropping batch of {} observations, {} writes already pending",
                batch.len(),
                self.in_flight.len()
            );
            return;
        }

        let size = batch.len();
        let store = Arc::clone(&self.store);
        let metrics = Arc::clone(&self.metrics);
        let task = self.in_flight.spawn(async move {
            persist(store.as_ref(), &batch, &metrics).await;
        });
        self.pending.insert(task.id(), size);
    }

    /// Number of writes that have not completed yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Waits for outstanding writes, up to the drain timeout.
    ///
    /// Writes still pending when the timeout elapses are aborted and their observations
    /// counted as dropped.
    pub async fn drain(&mut self) {
        let limit = self.drain_timeout;
        let drained = time::timeout(limit, async {
            while let Some(result) = self.in_flight.join_next_with_id().await {
                self.settle(result);
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "Abandoning {} pending writes after {:?}",
                self.in_flight.len(),
                limit
            );
            self.in_flight.abort_all();
            while let Some(result) = self.in_flight.join_next_with_id().await {
                self.settle(result);
            }
        }
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.in_flight.try_join_next_with_id() {
            self.settle(result);
        }
    }

    fn settle(&mut self, result: Result<(Id, ()), JoinError>) {
        match result {
            Ok((id, ())) => {
                self.pending.remove(&id);
            }
            Err(e) => {
                let dropped = self.pending.remove(&e.id()).unwrap_or(0);
                self.metrics.record_batch_failure(dropped);
                if e.is_cancelled() {
                    warn!("Aborted write of {} observations", dropped);
                } else {
                    error!("Write of {} observations failed: {}", dropped, e);
                }
            }
        }
    }
}

/// Writes one batch and records the outcome.
///
/// Returns the store's report, or `None` when the whole batch was dropped.
pub async fn persist(
    store: &dyn ObservationStore,
    batch: &ObservationBatch,
    metrics: &EngineMetrics,
) -> Option<AppendReport> {
    match store.append_observations(batch).await {
        Ok(report) => {
            metrics.record_persisted(report.written, report.failed);
            if report.is_complete() {
                debug!("Persisted {} observations", report.written);
            } else {
                warn!(
                    "Persisted {} of {} observations, {} dropped",
                    report.written,
                    batch.len(),
                    report.failed
                );
            }
            Some(report)
        }
        Err(e) => {
            metrics.record_batch_failure(batch.len());
            error!(
                "Dropping batch of {} observations, bulk write failed: {}",
                batch.len(),
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use market::{PriceObservation, StoreError};
    use std::sync::Mutex;

    /// Panics inside every write.
    struct PanickingStore;

    #[async_trait]
    impl ObservationStore for PanickingStore {
        async fn append_observations(
            &self,
            _batch: &ObservationBatch,
        ) -> Result<AppendReport, StoreError> {
            panic!("driver bug");
        }
    }

    /// Never acknowledges a write.
    struct StuckStore;

    #[async_trait]
    impl ObservationStore for StuckStore {
        async fn append_observations(
            &self,
            _batch: &ObservationBatch,
        ) -> Result<AppendReport, StoreError> {
            std::future::pending().await
        }
    }

    /// Rejects observations for symbols in `reject`, fails every batch when `down`.
    #[derive(Default)]
    struct FlakyStore {
        down: bool,
        reject: Vec<&'static str>,
        written: Mutex<Vec<PriceObservation>>,
    }

    #[async_trait]
    impl ObservationStore for FlakyStore {
        async fn append_observations(
            &self,
            batch: &ObservationBatch,
        ) -> Result<AppendReport, StoreError> {
            if self.down {
                return Err(StoreError::unavailable("store offline"));
            }
            let mut written = self.written.lock().unwrap();
            let mut report = AppendReport::default();
            for obs in batch {
                if self.reject.iter().any(|s| *s == obs.symbol()) {
                    report.failed += 1;
                } else {
                    written.push(obs.clone());
                    report.written += 1;
                }
            }
            Ok(report)
        }
    }

    fn batch(symbols: &[&str]) -> ObservationBatch {
        let ts = Utc::now();
        symbols
            .iter()
            .map(|s| PriceObservation::new(*s, ts, 10.0))
            .collect()
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_observations() {
        let store = FlakyStore {
            reject: vec!["B"],
            ..Default::default()
        };
        let metrics = EngineMetrics::new();

        let report = persist(&store, &batch(&["A", "B", "C"]), &metrics)
            .await
            .unwrap();

        assert_eq!(report, AppendReport::new(2, 1));
        assert_eq!(store.written.lock().unwrap().len(), 2);
        let snap = metrics.snapshot();
        assert_eq!(snap.observations_persisted, 2);
        assert_eq!(snap.observations_dropped, 1);
        assert_eq!(snap.batches_failed, 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_drops_batch() {
        let store = FlakyStore {
            down: true,
            ..Default::default()
        };
        let metrics = EngineMetrics::new();

        assert!(persist(&store, &batch(&["A", "B"]), &metrics).await.is_none());

        let snap = metrics.snapshot();
        assert_eq!(snap.batches_failed, 1);
        assert_eq!(snap.observations_dropped, 2);
        assert_eq!(snap.observations_persisted, 0);
    }

    #[tokio::test]
    async fn test_submit_then_drain() {
        let store = Arc::new(FlakyStore::default());
        let metrics = Arc::new(EngineMetrics::new());
        let mut sink = ObservationSink::new(store.clone(), metrics.clone());

        sink.submit(batch(&["A", "B"]));
        sink.submit(ObservationBatch::default());
        sink.submit(batch(&["C"]));
        sink.drain().await;

        assert_eq!(sink.in_flight(), 0);
        assert_eq!(store.written.lock().unwrap().len(), 3);
        assert_eq!(metrics.snapshot().observations_persisted, 3);
    }

    #[tokio::test]
    async fn test_panicking_write_counts_as_dropped() {
        let metrics = Arc::new(EngineMetrics::new());
        let mut sink = ObservationSink::new(Arc::new(PanickingStore), metrics.clone());

        sink.submit(batch(&["A", "B", "C"]));
        sink.submit(batch(&["D"]));
        sink.drain().await;

        let snap = metrics.snapshot();
        assert_eq!(snap.batches_failed, 2);
        assert_eq!(snap.observations_dropped, 4);
        assert_eq!(snap.observations_persisted, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_gives_up_on_stuck_store() {
        let metrics = Arc::new(EngineMetrics::new());
        let mut sink = ObservationSink::new(Arc::new(StuckStore), metrics.clone())
            .with_drain_timeout(Duration::from_secs(2));

        sink.submit(batch(&["A", "B"]));
        sink.submit(batch(&["C"]));

        let started = time::Instant::now();
        sink.drain().await;

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(sink.in_flight(), 0);
        let snap = metrics.snapshot();
        assert_eq!(snap.batches_failed, 2);
        assert_eq!(snap.observations_dropped, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_beyond_pending_limit_are_dropped() {
        let metrics = Arc::new(EngineMetrics::new());
        let mut sink = ObservationSink::new(Arc::new(StuckStore), metrics.clone())
            .with_max_pending(2)
            .with_drain_timeout(Duration::from_millis(10));

        for _ in 0..5 {
            sink.submit(batch(&["A", "B"]));
        }
        assert_eq!(sink.in_flight(), 2);
        assert_eq!(metrics.snapshot().observations_dropped, 6);

        sink.drain().await;
        let snap = metrics.snapshot();
        assert_eq!(snap.batches_failed, 5);
        assert_eq!(snap.observations_dropped, 10);
    }
}
