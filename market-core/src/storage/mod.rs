//! Storage collaborators of the engine.
//!
//! - `memory`: in-process registry and time series with retention.
//! - `file`: instrument registry read from a JSON file.
//! - `retention`: background sweep that expires old observations.

pub mod file;
pub mod memory;
pub mod retention;

pub use file::JsonInstrumentFile;
pub use memory::InMemoryTimeSeries;
pub use retention::spawn_retention_sweeper;

use market::Instrument;

/// The instruments seeded into an empty registry.
pub fn base_instruments() -> Vec<Instrument> {
    vec![
        Instrument::new("MNT", 0.12, 0.35, 85.0).with_name("Mountain Dragon"),
        Instrument::new("INF", 0.08, 0.45, 420.0).with_name("Infernal Dragon"),
        Instrument::new("ELD", 0.15, 0.60, 69.0).with_name("Elder Dragon"),
        Instrument::new("CLD", 0.25, 0.80, 1337.0).with_name("Cloud Dragon"),
    ]
}
