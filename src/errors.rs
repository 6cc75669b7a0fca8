//! Error types for the notebooks application.
//!
//! This module defines the error type shared by the store, the storage backends
//! and the command-line front end.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the notebooks application.
#[derive(Error, Debug)]
pub enum NotebookError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Notebook was not found when performing an operation.
    #[error("Notebook not found: {id}")]
    NotebookNotFound { id: String },

    /// Note was not found inside the given notebook.
    #[error("Note {note_id} not found in notebook {notebook_id}")]
    NoteNotFound {
        notebook_id: String,
        note_id: String,
    },

    /// Input rejected before it reached the store.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Invalid snapshot or persisted data format.
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    /// The state could not be written even after retrying.
    #[error("Failed to persist '{key}' after {attempts} attempts: {message}")]
    PersistFailed {
        key: String,
        attempts: u32,
        message: String,
    },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
