use std::{collections::HashSet, fs, path::Path};

use log::{debug, error, trace, warn};
use serde::de::DeserializeOwned;

use crate::{
    is_hex_color, Notebook, NotebookError, Result, StoreSnapshot, MAX_NOTEBOOK_NAME_LEN,
};

/// Decodes a stored value, falling back to `T::default()` when it is missing or
/// cannot be read or parsed.
pub fn decode_or_default<T>(key: &str, stored: Result<Option<String>>) -> T
where
    T: DeserializeOwned + Default,
{
    match stored {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => {
                trace!("Decoded stored '{}'", key);
                value
            }
            Err(e) => {
                warn!("Stored '{}' is not valid, starting from defaults: {}", key, e);
                T::default()
            }
        },
        Ok(None) => {
            debug!("Nothing stored under '{}', starting from defaults", key);
            T::default()
        }
        Err(e) => {
            warn!("Failed to read '{}', starting from defaults: {}", key, e);
            T::default()
        }
    }
}

/// Loads and validates a snapshot file written by `export`
pub fn load_snapshot_from_file(path: &Path) -> Result<StoreSnapshot> {
    debug!("Loading snapshot from file: {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| {
        error!("Failed to open snapshot file {}: {}", path.display(), e);
        NotebookError::Io(e)
    })?;

    let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
    validate_snapshot(&snapshot)?;

    trace!(
        "Successfully loaded snapshot with {} notebooks",
        snapshot.notebooks.len()
    );
    Ok(snapshot)
}

/// Checks id uniqueness and required fields of a snapshot
pub fn validate_snapshot(snapshot: &StoreSnapshot) -> Result<()> {
    validate_notebooks(&snapshot.notebooks).inspect_err(|e| error!("Invalid snapshot: {}", e))
}

/// Notebook and note ids are non-empty and unique, and every note has text
pub fn validate_notebooks(notebooks: &[Notebook]) -> Result<()> {
    let mut notebook_ids = HashSet::new();
    let mut note_ids = HashSet::new();

    for notebook in notebooks {
        if notebook.id.is_empty() {
            return Err(invalid_format("a notebook has an empty ID".to_string()));
        }
        if !notebook_ids.insert(notebook.id.as_str()) {
            return Err(invalid_format(format!(
                "notebook ID {} appears more than once",
                notebook.id
            )));
        }
        for note in &notebook.notes {
            if note.id.is_empty() {
                return Err(invalid_format(format!(
                    "a note in notebook {} has an empty ID",
                    notebook.id
                )));
            }
            if !note_ids.insert(note.id.as_str()) {
                return Err(invalid_format(format!(
                    "note ID {} appears more than once",
                    note.id
                )));
            }
            if note.text.trim().is_empty() {
                return Err(invalid_format(format!("note {} has no text", note.id)));
            }
        }
    }
    Ok(())
}

fn invalid_format(message: String) -> NotebookError {
    NotebookError::InvalidFormat { message }
}

/// Trims a notebook name and enforces the length cap
pub fn normalize_notebook_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(NotebookError::InvalidInput {
            message: "Notebook name cannot be empty".to_string(),
        });
    }
    if name.chars().count() > MAX_NOTEBOOK_NAME_LEN {
        return Err(NotebookError::InvalidInput {
            message: format!(
                "Notebook name is longer than {} characters",
                MAX_NOTEBOOK_NAME_LEN
            ),
        });
    }
    Ok(name.to_string())
}

pub fn parse_color(value: &str) -> Result<String> {
    let value = value.trim();
    if is_hex_color(value) {
        Ok(value.to_string())
    } else {
        Err(NotebookError::InvalidInput {
            message: format!("'{}' is not a hex color such as #3B82F6", value),
        })
    }
}

pub fn parse_opacity(value: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(NotebookError::InvalidInput {
            message: format!("Opacity {} is outside 0.0 to 1.0", value),
        })
    }
}
