//! Defines the write and read contracts of the price time-series store.
//!
//! The engine only ever appends to the store through `ObservationStore`. Readers (listing
//! endpoints, dashboards) go through `LatestPriceReader`. Observations are immutable and
//! append-only, so neither side needs to coordinate with the other.

use crate::error::StoreError;
use crate::model::observation::{ObservationBatch, PriceObservation};
use crate::model::summary::PriceSummary;
use async_trait::async_trait;

/// Outcome of an unordered bulk append.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendReport {
    /// Observations committed to the store.
    pub written: usize,
    /// Observations the store rejected individually.
    pub failed: usize,
}

impl AppendReport {
    pub fn new(written: usize, failed: usize) -> Self {
        Self { written, failed }
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// A sink for simulated price observations.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use market::{AppendReport, ObservationBatch, ObservationStore, StoreError};
///
/// struct Discard;
///
/// #[async_trait]
/// impl ObservationStore for Discard {
///     async fn append_observations(
///         &self,
///         batch: &ObservationBatch,
///     ) -> Result<AppendReport, StoreError> {
///         Ok(AppendReport::new(batch.len(), 0))
///     }
/// }
/// ```
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Appends a batch as an unordered, non-atomic bulk write.
    ///
    /// Each observation is independent: a failure on one must not prevent the others from
    /// being committed. Per-observation failures are reported in `AppendReport::failed`.
    /// An `Err` means the whole batch could not be attempted (e.g. store unavailable).
    async fn append_observations(&self, batch: &ObservationBatch)
    -> Result<AppendReport, StoreError>;
}

/// Read access to the persisted time series.
#[async_trait]
pub trait LatestPriceReader: Send + Sync {
    /// Returns the observation with the greatest timestamp for `symbol`.
    ///
    /// `Ok(None)` means no observation exists yet. This is a normal condition, not a fault.
    async fn latest_observation(&self, symbol: &str)
    -> Result<Option<PriceObservation>, StoreError>;

    /// Same as `latest_observation`, presented as a `PriceSummary`.
    async fn latest_summary(&self, symbol: &str) -> Result<Option<PriceSummary>, StoreError> {
        Ok(self
            .latest_observation(symbol)
            .await?
            .as_ref()
            .map(PriceSummary::from))
    }
}
