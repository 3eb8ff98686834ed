use crate::storage::InMemoryTimeSeries;
use chrono::Utc;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Periodically expires observations older than the store's retention window.
///
/// Runs independently of the price engine until `cancel` fires.
pub fn spawn_retention_sweeper(
    store: Arc<InMemoryTimeSeries>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Retention sweeper started: window {:?}, every {:?}",
            store.retention(),
            every
        );
        let mut ticker = tokio::time::interval(every);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = store.purge_expired(Utc::now()) {
                        error!("Retention sweep failed: {}", e);
                    }
                }
            }
        }

        info!("Retention sweeper stopped");
    })
}
