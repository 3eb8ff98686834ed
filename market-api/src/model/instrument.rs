//! Defines the static parameters of a simulated instrument.
//!
//! An `Instrument` is loaded once when the engine starts and is never mutated afterwards.
//! The simulated price itself lives in the engine's state store, not here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The ticker symbol identifying an instrument (e.g. "MNT").
pub type Symbol = String;

/// Reasons an instrument definition cannot be simulated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstrumentError {
    #[error("instrument symbol is empty")]
    EmptySymbol,

    #[error("{symbol}: {field} must be a finite number, got {value}")]
    NonFinite {
        symbol: Symbol,
        field: &'static str,
        value: f64,
    },

    #[error("{symbol}: volatility must be >= 0, got {value}")]
    NegativeVolatility { symbol: Symbol, value: f64 },

    #[error("{symbol}: start price must be > 0, got {value}")]
    NonPositiveStartPrice { symbol: Symbol, value: f64 },
}

/// Immutable simulation parameters for one tradable instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// The unique ticker symbol.
    symbol: Symbol,

    /// Human-readable name (e.g. "Mountain Dragon").
    #[serde(default)]
    name: String,

    /// Annualized expected rate of return.
    drift: f64,

    /// Annualized standard deviation of returns.
    volatility: f64,

    /// Price the simulation starts from.
    start_price: f64,
}

impl Instrument {
    /// Creates a new Instrument.
    ///
    /// # Arguments
    ///
    /// * `symbol` - The ticker symbol.
    /// * `drift` - Annualized expected return.
    /// * `volatility` - Annualized standard deviation, must be >= 0.
    /// * `start_price` - Initial price, must be > 0.
    pub fn new(symbol: impl Into<Symbol>, drift: f64, volatility: f64, start_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            name: String::new(),
            drift,
            volatility,
            start_price,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn start_price(&self) -> f64 {
        self.start_price
    }

    /// Checks that the parameters describe a simulatable instrument.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.symbol.trim().is_empty() {
            return Err(InstrumentError::EmptySymbol);
        }

        for (field, value) in [
            ("drift", self.drift),
            ("volatility", self.volatility),
            ("start_price", self.start_price),
        ] {
            if !value.is_finite() {
                return Err(InstrumentError::NonFinite {
                    symbol: self.symbol.clone(),
                    field,
                    value,
                });
            }
        }

        if self.volatility < 0.0 {
            return Err(InstrumentError::NegativeVolatility {
                symbol: self.symbol.clone(),
                value: self.volatility,
            });
        }

        if self.start_price <= 0.0 {
            return Err(InstrumentError::NonPositiveStartPrice {
                symbol: self.symbol.clone(),
                value: self.start_price,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_well_formed_instrument() {
        let inst = Instrument::new("MNT", 0.12, 0.35, 85.0).with_name("Mountain Dragon");
        assert!(inst.validate().is_ok());
        assert_eq!(inst.name(), "Mountain Dragon");
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert_eq!(
            Instrument::new("  ", 0.1, 0.2, 10.0).validate(),
            Err(InstrumentError::EmptySymbol)
        );
        assert!(matches!(
            Instrument::new("A", 0.1, -0.2, 10.0).validate(),
            Err(InstrumentError::NegativeVolatility { .. })
        ));
        assert!(matches!(
            Instrument::new("A", 0.1, 0.2, 0.0).validate(),
            Err(InstrumentError::NonPositiveStartPrice { .. })
        ));
        assert!(matches!(
            Instrument::new("A", f64::NAN, 0.2, 10.0).validate(),
            Err(InstrumentError::NonFinite { field: "drift", .. })
        ));
    }

    #[test]
    fn test_deserialize_uses_snake_case_fields_and_optional_name() {
        let json = r#"{"symbol":"ELD","drift":0.15,"volatility":0.6,"start_price":69.0}"#;
        let inst: Instrument = serde_json::from_str(json).unwrap();
        assert_eq!(inst.symbol(), "ELD");
        assert_eq!(inst.name(), "");
        assert_eq!(inst.start_price(), 69.0);
    }
}
