//! Advances a simulated price by one time increment.
//!
//! The default model is geometric Brownian motion:
//!
//! ```text
//! next = price * exp((drift - 0.5 * volatility^2) * dt + volatility * sqrt(dt) * z)
//! ```
//!
//! Stepping is a pure computation. The caller supplies the random draw `z`, so a given
//! `(state, dt, z)` always yields the same price.

use crate::simulation::state::SimulationState;
use thiserror::Error;

/// Inputs a price model refuses to step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("price must be > 0, got {0}")]
    NonPositivePrice(f64),

    #[error("volatility must be >= 0, got {0}")]
    NegativeVolatility(f64),

    #[error("dt must be > 0, got {0}")]
    NonPositiveDt(f64),
}

/// A stochastic process that produces the next price of an instrument.
pub trait PriceModel: Send + Sync {
    /// Returns the price after `dt` years given the standard normal draw `z`.
    ///
    /// Implementations must return a strictly positive, finite price, or an error.
    fn step(&self, state: &SimulationState, dt: f64, z: f64) -> Result<f64, StepError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricBrownianMotion;

impl PriceModel for GeometricBrownianMotion {
    fn step(&self, state: &SimulationState, dt: f64, z: f64) -> Result<f64, StepError> {
        gbm_step(state.price(), state.drift(), state.volatility(), dt, z)
    }
}

/// One GBM update.
///
/// A numerically degenerate result (zero, negative, NaN or infinite) is discarded and the
/// input price is returned unchanged.
pub fn gbm_step(price: f64, drift: f64, volatility: f64, dt: f64, z: f64) -> Result<f64, StepError> {
    for (name, value) in [
        ("price", price),
        ("drift", drift),
        ("volatility", volatility),
        ("dt", dt),
        ("z", z),
    ] {
        if !value.is_finite() {
            return Err(StepError::NonFinite { name, value });
        }
    }
    if price <= 0.0 {
        return Err(StepError::NonPositivePrice(price));
    }
    if volatility < 0.0 {
        return Err(StepError::NegativeVolatility(volatility));
    }
    if dt <= 0.0 {
        return Err(StepError::NonPositiveDt(dt));
    }

    let exponent = (drift - 0.5 * volatility * volatility) * dt + volatility * dt.sqrt() * z;
    let next = price * exponent.exp();

    if next.is_finite() && next > 0.0 {
        Ok(next)
    } else {
        Ok(price)
    }
}
