//! The simulated price feed service.
//!
//! Loads the instrument registry, runs the price engine in the background and expires old
//! observations until interrupted with Ctrl-C.

use anyhow::{Context, Result};
use log::{info, warn};
use market::InstrumentSource;
use market_core::args::CommonArgs;
use market_core::configuration::EngineSettings;
use market_core::engine::{EngineExit, PriceEngine};
use market_core::logging;
use market_core::storage::{
    base_instruments, spawn_retention_sweeper, InMemoryTimeSeries, JsonInstrumentFile,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CommonArgs::parse_args(std::env::args().collect());
    let settings = EngineSettings::from_args(&args)?;
    logging::init(&settings.log_level);

    info!("=== Price Feed Starting ===");

    // 1. Storage
    let store = Arc::new(InMemoryTimeSeries::new(settings.retention()));
    let source: Arc<dyn InstrumentSource> = match &settings.instruments_file {
        Some(path) => {
            let file = JsonInstrumentFile::new(path);
            if !file.exists() {
                info!("Seeding instrument file {:?} with base instruments", path);
                file.save(&base_instruments())
                    .with_context(|| format!("Failed to seed instrument file {:?}", path))?;
            }
            Arc::new(file)
        }
        None => {
            let seeded = store.ensure_base_instruments()?;
            info!("Seeded {} base instruments", seeded);
            store.clone()
        }
    };

    // 2. Background services
    let shutdown = CancellationToken::new();
    let sweeper = spawn_retention_sweeper(
        store.clone(),
        settings.retention_sweep_interval(),
        shutdown.clone(),
    );
    let engine = PriceEngine::new(source, store.clone(), settings);
    let metrics = engine.metrics();
    let handle = engine.start();

    // 3. Run until interrupted
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Interrupt received, shutting down");

    shutdown.cancel();
    match handle.stop().await {
        EngineExit::Stopped { ticks } => info!("Engine stopped after {} ticks", ticks),
        EngineExit::NotStarted(e) => warn!("Engine never started: {}", e),
        EngineExit::Crashed(e) => warn!("Engine crashed: {}", e),
    }
    if let Err(e) = sweeper.await {
        warn!("Retention sweeper ended abnormally: {}", e);
    }

    let metrics = metrics.snapshot();
    info!(
        "Observations: {} emitted, {} persisted, {} dropped; {} stored",
        metrics.observations_emitted,
        metrics.observations_persisted,
        metrics.observations_dropped,
        store.observation_count()?
    );

    Ok(())
}
