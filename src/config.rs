use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{NotebookError, PersistPolicy, Result};

const CONFIG_FILE_NAME: &str = "config.json";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory where notebooks and preferences are stored
    pub data_dir: PathBuf,

    /// Total write attempts before a mutation reports a persistence failure
    pub write_attempts: u32,

    /// Delay before the first retry, doubled on each further retry (in milliseconds)
    pub retry_backoff_ms: u64,

    /// Speech model handed to the voice input backend, if any
    pub speech_model_path: Option<PathBuf>,

    /// Whether destructive commands ask for confirmation
    pub confirm_deletes: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".notebooks"));

        Self {
            data_dir,
            write_attempts: 3,
            retry_backoff_ms: 50,
            speech_model_path: None,
            confirm_deletes: true,
        }
    }
}

impl Config {
    /// Location used when no `--config` path is given
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads the configuration, falling back to defaults when the file is missing
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                debug!("No configuration directory available, using defaults");
                return Ok(Self::default());
            }
        };

        if !path.exists() {
            debug!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| NotebookError::ConfigError {
                message: format!("Invalid configuration in {}: {}", path.display(), e),
            })?;

        if config.write_attempts == 0 {
            return Err(NotebookError::ConfigError {
                message: "write_attempts must be at least 1".to_string(),
            });
        }

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Writes the configuration as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| NotebookError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    pub fn persist_policy(&self) -> PersistPolicy {
        PersistPolicy {
            max_attempts: self.write_attempts.max(1),
            initial_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("app", "notebooks", "notebooks")
}
