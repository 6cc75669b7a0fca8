use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::PathBuf,
};

use log::{debug, error, trace};
use tempfile::NamedTempFile;

use crate::{NotebookError, Result};

/// Key-value persistence used by the notebook store.
///
/// Values are opaque strings (JSON documents in practice); keys are short stable
/// identifiers such as `notebooks` and `preferences`.
pub trait StateStorage {
    /// Returns `None` when nothing was ever written under `key`.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores every key as `<dir>/<key>.json`, replacing files atomically.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Helper method to get the file path for a key
    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            debug!("Creating data directory: {}", self.dir.display());
            fs::create_dir_all(&self.dir).map_err(|e| {
                error!("Failed to create directory {}: {}", self.dir.display(), e);
                NotebookError::DirectoryError {
                    path: self.dir.clone(),
                }
            })?;
        }
        Ok(())
    }
}

impl StateStorage for JsonFileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            trace!("No stored value for key '{}'", key);
            return Ok(None);
        }

        debug!("Reading '{}' from {}", key, path.display());
        let content = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            NotebookError::Io(e)
        })?;
        Ok(Some(content))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir()?;
        let path = self.key_path(key);

        // Temp file in the same directory so the final rename stays on one filesystem
        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NotebookError::Io(e)
        })?;

        trace!("Writing {} bytes for key '{}'", value.len(), key);
        temp_file.write_all(value.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            NotebookError::Io(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            NotebookError::Io(e)
        })?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            NotebookError::Io(e.error)
        })?;

        debug!("Stored '{}' at {}", key, path.display());
        Ok(())
    }
}

/// In-memory backend for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    /// Number of upcoming writes that fail with an I/O error
    failing_writes: u32,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` writes fail.
    pub fn fail_next_writes(&mut self, count: u32) {
        self.failing_writes = count;
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl StateStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(NotebookError::Io(std::io::Error::other(format!(
                "simulated write failure for '{}'",
                key
            ))));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
