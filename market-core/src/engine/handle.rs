use crate::error::EngineError;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a price engine. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Created, loading instruments, or never started because loading failed.
    Idle,
    /// Ticking.
    Running,
    /// Cancelled after running; no further ticks will occur.
    Stopped,
}

/// How the engine task ended.
#[derive(Debug)]
pub enum EngineExit {
    /// The tick loop never ran.
    NotStarted(EngineError),
    /// The tick loop ran and stopped on cancellation.
    Stopped { ticks: u64 },
    /// The engine task itself panicked or was aborted.
    Crashed(String),
}

/// Controls a running engine: cancellation, phase, metrics and completion.
pub struct EngineHandle {
    cancel: CancellationToken,
    phase: watch::Receiver<EnginePhase>,
    metrics: Arc<EngineMetrics>,
    task: JoinHandle<EngineExit>,
}

impl EngineHandle {
    pub(crate) fn new(
        cancel: CancellationToken,
        phase: watch::Receiver<EnginePhase>,
        metrics: Arc<EngineMetrics>,
        task: JoinHandle<EngineExit>,
    ) -> Self {
        Self {
            cancel,
            phase,
            metrics,
            task,
        }
    }

    /// Requests shutdown. A tick already in progress completes first.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> EnginePhase {
        *self.phase.borrow()
    }

    /// A receiver that observes every phase change.
    pub fn watch_phase(&self) -> watch::Receiver<EnginePhase> {
        self.phase.clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the engine task to end.
    pub async fn wait(self) -> EngineExit {
        match self.task.await {
            Ok(exit) => exit,
            Err(e) => EngineExit::Crashed(e.to_string()),
        }
    }

    /// Cancels the engine and waits for it to end.
    pub async fn stop(self) -> EngineExit {
        self.cancel();
        self.wait().await
    }
}
