//! # Market Core Library
//!
//! The price simulation engine and the runtime pieces around it.
//!
//! ## Modules
//! - `simulation`: Instrument registry loading, per-instrument state and the GBM stepper.
//! - `engine`: The tick scheduler, its lifecycle handle and the `PriceEngine` entry point.
//! - `sink`: Best-effort persistence of each tick's observations.
//! - `storage`: In-memory time series with retention, JSON instrument files.
//! - `metrics`: Counters for produced, persisted and dropped observations.
//! - `configuration`, `args`, `logging`: Settings, command line and logger bootstrap.

pub mod args;
pub mod configuration;
pub mod engine;
pub mod error;
pub mod fs;
pub mod logging;
pub mod metrics;
pub mod simulation;
pub mod sink;
pub mod storage;

pub use engine::{EngineExit, EngineHandle, EnginePhase, PriceEngine};
pub use error::EngineError;
