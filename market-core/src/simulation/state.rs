use market::{Instrument, Symbol};
use std::collections::BTreeMap;

/// The mutable simulated state of one instrument.
///
/// `price` is always strictly positive and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    price: f64,
    drift: f64,
    volatility: f64,
}

impl SimulationState {
    pub fn new(price: f64, drift: f64, volatility: f64) -> Self {
        Self {
            price,
            drift,
            volatility,
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Replaces the price. Non-positive or non-finite prices are ignored.
    pub(crate) fn set_price(&mut self, price: f64) -> bool {
        if price.is_finite() && price > 0.0 {
            self.price = price;
            true
        } else {
            false
        }
    }
}

impl From<&Instrument> for SimulationState {
    fn from(instrument: &Instrument) -> Self {
        Self::new(
            instrument.start_price(),
            instrument.drift(),
            instrument.volatility(),
        )
    }
}

/// Symbol → current simulated state, owned by the engine.
///
/// Iteration is in symbol order so that seeded runs draw random numbers in a stable order.
#[derive(Debug, Default)]
pub struct StateStore {
    entries: BTreeMap<Symbol, SimulationState>,
}

impl StateStore {
    pub fn from_instruments<'a>(instruments: impl IntoIterator<Item = &'a Instrument>) -> Self {
        let entries = instruments
            .into_iter()
            .map(|inst| (inst.symbol().to_string(), SimulationState::from(inst)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, symbol: &str) -> Option<&SimulationState> {
        self.entries.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &SimulationState)> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&Symbol, &mut SimulationState)> {
        self.entries.iter_mut()
    }
}
