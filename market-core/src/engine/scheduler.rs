use crate::metrics::EngineMetrics;
use crate::simulation::{PriceModel, StateStore};
use crate::sink::ObservationSink;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use market::{ObservationBatch, PriceObservation};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Drives the price model over every instrument once per tick.
///
/// The scheduler is the only writer of the state store. Ticks run to completion on the
/// scheduler's task; only persistence of the resulting batch happens elsewhere.
pub struct TickScheduler {
    state: StateStore,
    model: Arc<dyn PriceModel>,
    rng: StdRng,
    dt: f64,
    sink: ObservationSink,
    metrics: Arc<EngineMetrics>,
}

impl TickScheduler {
    pub fn new(
        state: StateStore,
        model: Arc<dyn PriceModel>,
        rng: StdRng,
        dt: f64,
        sink: ObservationSink,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            state,
            model,
            rng,
            dt,
            sink,
            metrics,
        }
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Advances every instrument by one step and returns the resulting observations.
    ///
    /// An instrument whose model step errors or panics keeps its previous price and emits
    /// no observation; the rest of the tick proceeds.
    pub fn step_all(&mut self, now: DateTime<Utc>) -> ObservationBatch {
        let mut batch = ObservationBatch::with_capacity(self.state.len());
        let mut skipped = 0;

        for (symbol, state) in self.state.iter_mut() {
            let z: f64 = self.rng.sample(StandardNormal);
            let model = &self.model;
            let dt = self.dt;

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| model.step(state, dt, z)));

            match outcome {
                Ok(Ok(next)) => {
                    if state.set_price(next) {
                        batch.push(PriceObservation::new(symbol.as_str(), now, next));
                    } else {
                        warn!("{}: model returned invalid price {}, skipping", symbol, next);
                        skipped += 1;
                    }
                }
                Ok(Err(e)) => {
                    warn!("{}: step failed, skipping: {}", symbol, e);
                    skipped += 1;
                }
                Err(_) => {
                    warn!("{}: step panicked, skipping", symbol);
                    skipped += 1;
                }
            }
        }

        self.metrics.record_tick(batch.len(), skipped);
        batch
    }

    /// Runs one tick and hands its batch to the sink.
    pub fn tick(&mut self, now: DateTime<Utc>) -> usize {
        let batch = self.step_all(now);
        let emitted = batch.len();
        debug!("Tick at {}: {} observations", now, emitted);
        self.sink.submit(batch);
        emitted
    }

    /// Ticks every `period` until `cancel` fires, then waits for pending writes.
    ///
    /// The first tick fires one full period after the call. Cancellation is only observed
    /// between ticks.
    pub async fn run(&mut self, period: Duration, cancel: &CancellationToken) {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Tick scheduler running: {} instruments every {:?}",
            self.state.len(),
            period
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick(Utc::now());
                }
            }
        }

        info!(
            "Tick scheduler stopping, waiting for {} pending writes",
            self.sink.in_flight()
        );
        self.sink.drain().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{GeometricBrownianMotion, SimulationState, StepError};
    use async_trait::async_trait;
    use market::{AppendReport, Instrument, ObservationStore, StoreError};
    use rand::SeedableRng;

    struct NullStore;

    #[async_trait]
    impl ObservationStore for NullStore {
        async fn append_observations(
            &self,
            batch: &ObservationBatch,
        ) -> Result<AppendReport, StoreError> {
            Ok(AppendReport::new(batch.len(), 0))
        }
    }

    /// Panics on instruments whose drift is exactly 13.
    struct CursedModel;

    impl PriceModel for CursedModel {
        fn step(&self, state: &SimulationState, dt: f64, z: f64) -> Result<f64, StepError> {
            if state.drift() == 13.0 {
                panic!("cursed instrument");
            }
            if state.drift() == -13.0 {
                return Err(StepError::NonPositiveDt(dt));
            }
            GeometricBrownianMotion.step(state, dt, z)
        }
    }

    fn scheduler(instruments: &[Instrument], model: Arc<dyn PriceModel>, seed: u64) -> TickScheduler {
        let metrics = Arc::new(EngineMetrics::new());
        TickScheduler::new(
            StateStore::from_instruments(instruments),
            model,
            StdRng::seed_from_u64(seed),
            1.0 / 86400.0,
            ObservationSink::new(Arc::new(NullStore), metrics.clone()),
            metrics,
        )
    }

    fn instruments() -> Vec<Instrument> {
        vec![
            Instrument::new("MNT", 0.12, 0.35, 85.0),
            Instrument::new("INF", 0.08, 0.45, 420.0),
            Instrument::new("ELD", 0.15, 0.60, 69.0),
        ]
    }

    #[test]
    fn test_step_all_emits_one_observation_per_instrument() {
        let mut sched = scheduler(&instruments(), Arc::new(GeometricBrownianMotion), 1);
        let now = Utc::now();

        let batch = sched.step_all(now);

        assert_eq!(batch.len(), 3);
        assert_eq!(sched.state().len(), 3);
        for obs in &batch {
            assert_eq!(obs.timestamp(), now);
            assert_eq!(sched.state().get(obs.symbol()).unwrap().price(), obs.price());
        }
    }

    #[test]
    fn test_same_seed_same_path() {
        let mut a = scheduler(&instruments(), Arc::new(GeometricBrownianMotion), 42);
        let mut b = scheduler(&instruments(), Arc::new(GeometricBrownianMotion), 42);
        let now = Utc::now();

        for _ in 0..10 {
            assert_eq!(a.step_all(now), b.step_all(now));
        }
    }

    #[test]
    fn test_bad_instrument_does_not_abort_tick() {
        let mut list = instruments();
        list.push(Instrument::new("BOOM", 13.0, 0.1, 10.0));
        list.push(Instrument::new("ERR", -13.0, 0.1, 20.0));
        let mut sched = scheduler(&list, Arc::new(CursedModel), 7);

        let batch = sched.step_all(Utc::now());

        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|o| o.symbol() != "BOOM" && o.symbol() != "ERR"));
        assert_eq!(sched.state().len(), 5);
        assert_eq!(sched.state().get("BOOM").unwrap().price(), 10.0);
        assert_eq!(sched.state().get("ERR").unwrap().price(), 20.0);

        let snap = sched.metrics.snapshot();
        assert_eq!(snap.instruments_skipped, 2);
        assert_eq!(snap.observations_emitted, 3);
    }
}
