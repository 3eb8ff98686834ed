use crate::fs::{load_json, save_json};
use async_trait::async_trait;
use market::{Instrument, InstrumentSource, StoreError};
use std::path::{Path, PathBuf};

/// An instrument registry stored as a JSON array on disk.
///
/// ```json
/// [{ "symbol": "MNT", "name": "Mountain Dragon", "drift": 0.12, "volatility": 0.35, "start_price": 85.0 }]
/// ```
#[derive(Debug, Clone)]
pub struct JsonInstrumentFile {
    path: PathBuf,
}

impl JsonInstrumentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Writes `instruments` to the file, replacing its contents atomically.
    pub fn save(&self, instruments: &[Instrument]) -> Result<(), StoreError> {
        save_json(&self.path, &instruments)
    }
}

#[async_trait]
impl InstrumentSource for JsonInstrumentFile {
    async fn load_instruments(&self) -> Result<Vec<Instrument>, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_json::<Vec<Instrument>>(&path))
            .await
            .map_err(|e| StoreError::unavailable(format!("instrument file reader failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::base_instruments;

    #[tokio::test]
    async fn test_save_then_load() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = JsonInstrumentFile::new(dir.path().join("instruments.json"));
        assert!(!file.exists());

        file.save(&base_instruments())?;
        let loaded = file.load_instruments().await?;

        assert_eq!(loaded, base_instruments());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_file_is_serialization_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("instruments.json");
        std::fs::write(&path, "{ not json")?;

        let err = JsonInstrumentFile::new(path).load_instruments().await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        Ok(())
    }
}
