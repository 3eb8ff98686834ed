pub mod instrument_source;
pub mod observation_store;
