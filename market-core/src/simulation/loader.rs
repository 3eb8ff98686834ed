use crate::error::EngineError;
use log::{info, warn};
use market::{Instrument, InstrumentSource, Symbol};
use std::collections::BTreeMap;

/// The instruments the engine simulates for the lifetime of the run, keyed by symbol.
#[derive(Debug, Default)]
pub struct Registry {
    instruments: BTreeMap<Symbol, Instrument>,
    duplicates: usize,
    rejected: usize,
}

impl Registry {
    /// Builds a registry from instruments in storage order.
    ///
    /// Invalid instruments are skipped. When a symbol appears more than once the last
    /// definition wins.
    pub fn from_instruments(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        let mut registry = Self::default();

        for instrument in instruments {
            if let Err(e) = instrument.validate() {
                warn!("Skipping instrument: {}", e);
                registry.rejected += 1;
                continue;
            }

            let symbol = instrument.symbol().to_string();
            if let Some(previous) = registry.instruments.insert(symbol, instrument) {
                warn!(
                    "Duplicate instrument symbol {}, keeping the last definition read",
                    previous.symbol()
                );
                registry.duplicates += 1;
            }
        }

        registry
    }

    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Number of definitions that replaced an earlier one with the same symbol.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of definitions that failed validation.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }
}

/// Reads the full instrument set from `source`.
///
/// Fails with `EngineError::Load` when the source errors and with
/// `EngineError::NoInstruments` when nothing usable was returned.
pub async fn load_registry(source: &dyn InstrumentSource) -> Result<Registry, EngineError> {
    let instruments = source.load_instruments().await?;
    let registry = Registry::from_instruments(instruments);

    if registry.is_empty() {
        return Err(EngineError::NoInstruments);
    }

    info!(
        "Loaded {} instruments ({} duplicates, {} rejected)",
        registry.len(),
        registry.duplicates(),
        registry.rejected()
    );
    Ok(registry)
}
