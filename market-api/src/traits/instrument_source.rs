//! Defines where the engine reads its instrument registry from.

use crate::error::StoreError;
use crate::model::instrument::Instrument;
use async_trait::async_trait;

/// A provider of the configured instruments.
///
/// Implementors return every configured instrument, in storage order. The engine calls this
/// exactly once, at start.
#[async_trait]
pub trait InstrumentSource: Send + Sync {
    async fn load_instruments(&self) -> Result<Vec<Instrument>, StoreError>;
}
