use crate::configuration::DEFAULT_RETENTION;
use crate::storage::base_instruments;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use market::{
    AppendReport, Instrument, InstrumentSource, InstrumentSummary, LatestPriceReader,
    ObservationBatch, ObservationStore, PriceObservation, StoreError, Symbol,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// An in-process instrument registry and price time series.
///
/// Observations are append-only and kept per symbol. Entries older than the retention
/// window are removed by `purge_expired`, which the owner is expected to call
/// periodically.
#[derive(Debug)]
pub struct InMemoryTimeSeries {
    instruments: RwLock<Vec<Instrument>>,
    observations: RwLock<HashMap<Symbol, Vec<PriceObservation>>>,
    retention: Duration,
}

impl Default for InMemoryTimeSeries {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl InMemoryTimeSeries {
    pub fn new(retention: Duration) -> Self {
        Self {
            instruments: RwLock::new(Vec::new()),
            observations: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Creates a store whose registry holds the default instruments.
    pub fn with_base_instruments() -> Self {
        Self {
            instruments: RwLock::new(base_instruments()),
            ..Self::default()
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Adds an instrument to the registry, replacing any instrument with the same symbol.
    pub fn insert_instrument(&self, instrument: Instrument) -> Result<(), StoreError> {
        let mut instruments = self.write_instruments()?;
        match instruments
            .iter_mut()
            .find(|existing| existing.symbol() == instrument.symbol())
        {
            Some(existing) => *existing = instrument,
            None => instruments.push(instrument),
        }
        Ok(())
    }

    /// Seeds the default instruments if the registry is empty. Returns how many were added.
    pub fn ensure_base_instruments(&self) -> Result<usize, StoreError> {
        let mut instruments = self.write_instruments()?;
        if !instruments.is_empty() {
            return Ok(0);
        }
        *instruments = base_instruments();
        Ok(instruments.len())
    }

    /// Symbol and name of every registered instrument.
    pub fn list_instruments(&self) -> Result<Vec<InstrumentSummary>, StoreError> {
        Ok(self
            .read_instruments()?
            .iter()
            .map(InstrumentSummary::from)
            .collect())
    }

    /// All stored observations for `symbol`, oldest first.
    pub fn history(&self, symbol: &str) -> Result<Vec<PriceObservation>, StoreError> {
        let mut history = self
            .read_observations()?
            .get(symbol)
            .cloned()
            .unwrap_or_default();
        history.sort_by_key(|obs| obs.timestamp());
        Ok(history)
    }

    /// Total number of stored observations across all symbols.
    pub fn observation_count(&self) -> Result<usize, StoreError> {
        Ok(self.read_observations()?.values().map(Vec::len).sum())
    }

    /// Removes observations older than the retention window, measured from `now`.
    ///
    /// Returns the number of observations removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let retention = chrono::Duration::from_std(self.retention)
            .map_err(|e| StoreError::unavailable(format!("invalid retention: {}", e)))?;
        let cutoff = now - retention;

        let mut observations = self.write_observations()?;
        let mut removed = 0;
        for series in observations.values_mut() {
            let before = series.len();
            series.retain(|obs| obs.timestamp() >= cutoff);
            removed += before - series.len();
        }
        observations.retain(|_, series| !series.is_empty());

        if removed > 0 {
            debug!("Expired {} observations older than {}", removed, cutoff);
        }
        Ok(removed)
    }

    fn read_instruments(&self) -> Result<RwLockReadGuard<'_, Vec<Instrument>>, StoreError> {
        self.instruments
            .read()
            .map_err(|_| StoreError::unavailable("instrument registry lock poisoned"))
    }

    fn write_instruments(&self) -> Result<RwLockWriteGuard<'_, Vec<Instrument>>, StoreError> {
        self.instruments
            .write()
            .map_err(|_| StoreError::unavailable("instrument registry lock poisoned"))
    }

    fn read_observations(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<Symbol, Vec<PriceObservation>>>, StoreError> {
        self.observations
            .read()
            .map_err(|_| StoreError::unavailable("time series lock poisoned"))
    }

    fn write_observations(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<Symbol, Vec<PriceObservation>>>, StoreError> {
        self.observations
            .write()
            .map_err(|_| StoreError::unavailable("time series lock poisoned"))
    }
}

fn is_storable(observation: &PriceObservation) -> bool {
    !observation.symbol().is_empty() && observation.price().is_finite() && observation.price() > 0.0
}

#[async_trait]
impl InstrumentSource for InMemoryTimeSeries {
    async fn load_instruments(&self) -> Result<Vec<Instrument>, StoreError> {
        Ok(self.read_instruments()?.clone())
    }
}

#[async_trait]
impl ObservationStore for InMemoryTimeSeries {
    async fn append_observations(
        &self,
        batch: &ObservationBatch,
    ) -> Result<AppendReport, StoreError> {
        let mut observations = self.write_observations()?;
        let mut report = AppendReport::default();

        for observation in batch {
            if is_storable(observation) {
                observations
                    .entry(observation.symbol().to_string())
                    .or_default()
                    .push(observation.clone());
                report.written += 1;
            } else {
                report.failed += 1;
            }
        }

        Ok(report)
    }
}

#[async_trait]
impl LatestPriceReader for InMemoryTimeSeries {
    async fn latest_observation(
        &self,
        symbol: &str,
    ) -> Result<Option<PriceObservation>, StoreError> {
        if symbol.is_empty() {
            return Err(StoreError::InvalidSymbol);
        }

        Ok(self
            .read_observations()?
            .get(symbol)
            .and_then(|series| series.iter().max_by_key(|obs| obs.timestamp()))
            .cloned())
    }
}
