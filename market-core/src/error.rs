use market::StoreError;
use thiserror::Error;

/// Reasons the engine did not run its tick loop.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The registry was loaded but contained nothing to simulate.
    #[error("no instruments configured")]
    NoInstruments,

    /// The instrument source could not be read.
    #[error("failed to load instruments: {0}")]
    Load(#[from] StoreError),

    /// Cancellation arrived before the engine started ticking.
    #[error("cancelled before start")]
    Cancelled,
}
