//! The price simulation engine.
//!
//! A `PriceEngine` owns its random generator, its state store and its observation sink.
//! `start` moves it onto a background tokio task and returns an `EngineHandle` used to
//! watch, cancel and await it.
//!
//! # Examples
//!
//! ```no_run
//! use market_core::configuration::EngineSettings;
//! use market_core::engine::PriceEngine;
//! use market_core::storage::InMemoryTimeSeries;
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let store = Arc::new(InMemoryTimeSeries::with_base_instruments());
//! let engine = PriceEngine::new(store.clone(), store, EngineSettings::default());
//! let handle = engine.start();
//! // ...
//! handle.stop().await;
//! # }
//! ```

pub mod handle;
pub mod scheduler;

pub use handle::{EngineExit, EngineHandle, EnginePhase};
pub use scheduler::TickScheduler;

use crate::configuration::EngineSettings;
use crate::error::EngineError;
use crate::metrics::EngineMetrics;
use crate::simulation::{load_registry, GeometricBrownianMotion, PriceModel, StateStore};
use crate::sink::ObservationSink;
use log::{error, info};
use market::{InstrumentSource, ObservationStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub struct PriceEngine {
    source: Arc<dyn InstrumentSource>,
    store: Arc<dyn ObservationStore>,
    model: Arc<dyn PriceModel>,
    rng: StdRng,
    settings: EngineSettings,
    metrics: Arc<EngineMetrics>,
}

impl PriceEngine {
    /// Creates an engine using geometric Brownian motion.
    ///
    /// The random generator is seeded once, here, from `settings.seed` or OS entropy.
    pub fn new(
        source: Arc<dyn InstrumentSource>,
        store: Arc<dyn ObservationStore>,
        settings: EngineSettings,
    ) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            source,
            store,
            model: Arc::new(GeometricBrownianMotion),
            rng,
            settings,
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    /// Replaces the price model.
    pub fn with_model(mut self, model: impl PriceModel + 'static) -> Self {
        self.model = Arc::new(model);
        self
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Spawns the engine on the current tokio runtime.
    pub fn start(self) -> EngineHandle {
        let cancel = CancellationToken::new();
        let (phase_tx, phase_rx) = watch::channel(EnginePhase::Idle);
        let metrics = self.metrics();

        let token = cancel.clone();
        let task = tokio::spawn(async move { self.run(token, phase_tx).await });

        EngineHandle::new(cancel, phase_rx, metrics, task)
    }

    /// Loads instruments and ticks until `cancel` fires.
    ///
    /// If loading fails the phase stays `Idle` and no tick ever runs.
    pub async fn run(
        self,
        cancel: CancellationToken,
        phase: watch::Sender<EnginePhase>,
    ) -> EngineExit {
        let registry = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Price engine cancelled before start");
                return EngineExit::NotStarted(EngineError::Cancelled);
            }
            loaded = load_registry(self.source.as_ref()) => loaded,
        };

        let registry = match registry {
            Ok(registry) => registry,
            Err(e) => {
                error!("Price engine not started: {}", e);
                return EngineExit::NotStarted(e);
            }
        };

        let sink = ObservationSink::new(self.store, Arc::clone(&self.metrics))
            .with_max_pending(self.settings.max_pending_writes)
            .with_drain_timeout(self.settings.shutdown_drain());
        let mut scheduler = TickScheduler::new(
            StateStore::from_instruments(registry.instruments()),
            self.model,
            self.rng,
            self.settings.dt,
            sink,
            Arc::clone(&self.metrics),
        );

        phase.send_replace(EnginePhase::Running);
        scheduler
            .run(self.settings.tick_interval(), &cancel)
            .await;
        phase.send_replace(EnginePhase::Stopped);

        let ticks = self.metrics.snapshot().ticks;
        info!("Price engine stopped after {} ticks", ticks);
        EngineExit::Stopped { ticks }
    }
}
