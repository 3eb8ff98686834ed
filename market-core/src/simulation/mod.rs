pub mod loader;
pub mod state;
pub mod stepper;

pub use loader::{load_registry, Registry};
pub use state::{SimulationState, StateStore};
pub use stepper::{gbm_step, GeometricBrownianMotion, PriceModel, StepError};
