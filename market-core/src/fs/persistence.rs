use market::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Saves a serializable object to a JSON file atomically.
///
/// Writes to a temporary file next to the target and renames it into place, so readers
/// never observe a half-written file.
///
/// # Arguments
///
/// * `path` - The target file path.
/// * `value` - The object to serialize and save.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(value)?;

    let temp_path = path.with_extension("tmp");
    let mut temp_file = std::fs::File::create(&temp_path)?;
    temp_file.write_all(json.as_bytes())?;
    temp_file.sync_all()?;

    std::fs::rename(&temp_path, path)?;

    Ok(())
}

/// Loads a deserializable object from a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use market::Instrument;

    #[test]
    fn test_save_then_load_instruments() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("instruments.json");

        let instruments = vec![
            Instrument::new("MNT", 0.12, 0.35, 85.0),
            Instrument::new("INF", 0.08, 0.45, 420.0),
        ];
        save_json(&path, &instruments)?;

        let loaded: Vec<Instrument> = load_json(&path)?;
        assert_eq!(loaded, instruments);
        assert!(!path.with_extension("tmp").exists());
        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_json::<Vec<Instrument>>(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
