//! Shared types for the notebooks application.
//!
//! This module contains the Result alias, store events and snapshots, and the CLI
//! subcommands.
use std::path::PathBuf;

use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::{NotebookError, Notebook, Preferences};

/// A specialized Result type for notebooks operations.
pub type Result<T> = std::result::Result<T, NotebookError>;

/// Whether the store has rehydrated from storage yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded,
}

/// Emitted by the store after every applied mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    NotebookCreated { id: String },
    NotebookUpdated { id: String },
    NotebookDeleted { id: String },
    NoteAdded { notebook_id: String, note_id: String },
    NoteUpdated { notebook_id: String, note_id: String },
    NoteDeleted { notebook_id: String, note_id: String },
    PreferencesChanged,
    OnboardingChanged,
    /// The whole state was replaced (load or restore)
    Reloaded,
}

/// The complete store state in one serializable value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub notebooks: Vec<Notebook>,
    #[serde(default)]
    pub preferences: Preferences,
}

/// Totals reported after importing a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Path to the imported snapshot file
    pub source: PathBuf,
    pub notebooks: usize,
    pub notes: usize,
}

/// Available subcommands for the notebooks application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new notebook
    Create {
        /// Name of the notebook (at most 30 characters)
        name: String,

        /// Cover color as hex, defaults to the first preset color
        #[clap(short = 'C', long)]
        color: Option<String>,

        /// Default text color for notes
        #[clap(long, default_value = "#FFFFFF")]
        text_color: String,

        /// Default background color for notes
        #[clap(long, default_value = "#000000")]
        background_color: String,
    },

    /// List notebooks
    List {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show a notebook and its notes
    Show {
        /// ID of the notebook
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Change notebook fields, leaving the rest untouched
    Update {
        /// ID of the notebook
        id: String,

        #[clap(short = 'n', long)]
        name: Option<String>,

        #[clap(short = 'C', long)]
        color: Option<String>,

        #[clap(long)]
        text_color: Option<String>,

        #[clap(long)]
        background_color: Option<String>,

        /// Image shown on the home-screen card
        #[clap(long)]
        cover_image: Option<String>,

        /// Remove the cover image
        #[clap(long, conflicts_with = "cover_image")]
        clear_cover_image: bool,

        #[clap(long)]
        cover_image_opacity: Option<f32>,

        #[clap(long)]
        cover_image_color: Option<String>,

        #[clap(long)]
        cover_image_color_opacity: Option<f32>,

        /// Image shown behind the notes
        #[clap(long)]
        background_image: Option<String>,

        /// Remove the background image
        #[clap(long, conflicts_with = "background_image")]
        clear_background_image: bool,

        #[clap(long)]
        background_image_opacity: Option<f32>,

        #[clap(long)]
        background_image_color: Option<String>,

        #[clap(long)]
        background_image_color_opacity: Option<f32>,
    },

    /// Delete a notebook and all of its notes
    Delete {
        /// ID of the notebook to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Add a note to a notebook
    AddNote {
        /// ID of the notebook
        notebook_id: String,

        /// Text of the note
        #[clap(required_unless_present = "audio")]
        text: Option<String>,

        /// Transcribe the note from an audio file
        #[clap(short, long, conflicts_with = "text")]
        audio: Option<PathBuf>,
    },

    /// Edit a note's text or colors
    EditNote {
        notebook_id: String,
        note_id: String,

        #[clap(short, long)]
        text: Option<String>,

        #[clap(long)]
        background_color: Option<String>,

        #[clap(long)]
        text_color: Option<String>,
    },

    /// Delete a single note
    DeleteNote {
        notebook_id: String,
        note_id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Print a note's raw text for sharing
    Share {
        notebook_id: String,
        note_id: String,
    },

    /// Toggle dark mode
    DarkMode,

    /// Change the home-screen background
    HomeBackground {
        /// Background image path or URI
        #[clap(short, long)]
        image: Option<String>,

        /// Remove the background image
        #[clap(long, conflicts_with = "image")]
        clear_image: bool,

        #[clap(long)]
        opacity: Option<f32>,

        #[clap(short = 'C', long)]
        color: Option<String>,

        #[clap(long)]
        color_opacity: Option<f32>,
    },

    /// Show or advance first-run onboarding
    Onboarding {
        /// Accept the privacy policy
        #[clap(long)]
        accept_privacy_policy: bool,

        /// Mark the introduction as seen
        #[clap(long)]
        complete: bool,
    },

    /// Convert an HSL color to hex
    Color {
        /// Hue in degrees, 0 to 360
        #[clap(long, default_value_t = 0.0)]
        hue: f64,

        /// Saturation percentage
        #[clap(long, default_value_t = 100.0)]
        saturation: f64,

        /// Lightness percentage
        #[clap(long, default_value_t = 50.0)]
        lightness: f64,

        /// Opacity percentage
        #[clap(long, default_value_t = 100.0)]
        alpha: f64,
    },

    /// Export all notebooks and preferences to a JSON file
    Export {
        /// Path where the snapshot will be saved
        #[clap(short, long)]
        output: PathBuf,
    },

    /// Replace all notebooks and preferences from a JSON snapshot
    Import {
        /// Path to the snapshot file
        source: PathBuf,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}
