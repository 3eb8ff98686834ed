//! Price observation models.
//!
//! Includes `PriceObservation` for a single recorded price and `ObservationBatch` for the
//! set of observations produced by one engine tick.

use crate::model::instrument::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded (symbol, timestamp, price) point of the simulated time series.
///
/// Observations are append-only: once created they are never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    symbol: Symbol,
    #[serde(rename = "ts")]
    timestamp: DateTime<Utc>,
    price: f64,
}

impl PriceObservation {
    pub fn new(symbol: impl Into<Symbol>, timestamp: DateTime<Utc>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            price,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn price(&self) -> f64 {
        self.price
    }
}

/// The observations produced by a single tick.
///
/// Every observation in a batch carries the tick's timestamp. The batch has no ordering
/// guarantee; stores may write its entries in any order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationBatch {
    observations: Vec<PriceObservation>,
}

impl ObservationBatch {
    pub fn new(observations: Vec<PriceObservation>) -> Self {
        Self { observations }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            observations: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, observation: PriceObservation) {
        self.observations.push(observation);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PriceObservation> {
        self.observations.iter()
    }

    pub fn into_inner(self) -> Vec<PriceObservation> {
        self.observations
    }
}

impl<'a> IntoIterator for &'a ObservationBatch {
    type Item = &'a PriceObservation;
    type IntoIter = std::slice::Iter<'a, PriceObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

impl FromIterator<PriceObservation> for ObservationBatch {
    fn from_iter<I: IntoIterator<Item = PriceObservation>>(iter: I) -> Self {
        Self {
            observations: iter.into_iter().collect(),
        }
    }
}
