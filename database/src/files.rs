use pulse_core::CoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Reads a JSON array of records. A missing file is reported as
/// [`CoreError::MissingInput`] so callers can decide whether it is fatal.
pub fn read_json_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CoreError> {
    if !path.exists() {
        return Err(CoreError::MissingInput {
            path: path.display().to_string(),
        });
    }

    let reader = BufReader::new(File::open(path)?);
    let records: Vec<T> = serde_json::from_reader(reader)?;
    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Writes records as a pretty-printed JSON array, creating parent directories.
pub fn write_json_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
