pub mod error;
pub mod model;
pub mod traits;

pub use error::StoreError;
pub use model::instrument::{Instrument, InstrumentError, Symbol};
pub use model::observation::{ObservationBatch, PriceObservation};
pub use model::summary::{InstrumentSummary, PriceSummary};
pub use traits::instrument_source::InstrumentSource;
pub use traits::observation_store::{AppendReport, LatestPriceReader, ObservationStore};

pub mod prelude {
    pub use crate::model::instrument::Instrument;
    pub use crate::model::observation::{ObservationBatch, PriceObservation};
    pub use crate::traits::instrument_source::InstrumentSource;
    pub use crate::traits::observation_store::{AppendReport, LatestPriceReader, ObservationStore};
}
