//! Core data structures for the notebooks application.
//!
//! This module contains the Notebook and Note entities, the partial-update records
//! used to modify them, the global display preferences, and the accessors that
//! resolve unset cosmetic fields to their render-time defaults.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest notebook name the front end accepts.
pub const MAX_NOTEBOOK_NAME_LEN: usize = 30;

/// Tint drawn over background images when none is chosen.
pub const DEFAULT_TINT_COLOR: &str = "#3B82F6";
/// Tint opacity used when none is chosen.
pub const DEFAULT_TINT_OPACITY: f32 = 0.5;
/// Image opacity on the home-screen notebook cards.
pub const DEFAULT_COVER_IMAGE_OPACITY: f32 = 0.15;
/// Image opacity on the notebook detail view and the home screen.
pub const DEFAULT_BACKGROUND_IMAGE_OPACITY: f32 = 0.3;
/// Background of a note when neither the note nor its notebook sets one.
pub const DEFAULT_NOTE_BACKGROUND: &str = "#FFFFFF";

/// Represents a single note inside a notebook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Free-form note text
    pub text: String,
    /// Per-note background override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Per-note text color override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// When the note was created
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Creates a new note with a fresh id and the current time
    pub fn new(text: String) -> Self {
        Note {
            id: Uuid::new_v4().to_string(),
            text,
            background_color: None,
            text_color: None,
            created_at: Utc::now(),
        }
    }

    /// Background to draw behind this note inside `notebook`.
    pub fn resolved_background_color<'a>(&'a self, notebook: &'a Notebook) -> &'a str {
        self.background_color
            .as_deref()
            .or(notebook.background_color.as_deref())
            .unwrap_or(DEFAULT_NOTE_BACKGROUND)
    }

    /// Text color for this note inside `notebook` under `theme`.
    pub fn resolved_text_color<'a>(&'a self, notebook: &'a Notebook, theme: &Theme) -> &'a str {
        self.text_color
            .as_deref()
            .unwrap_or_else(|| notebook.resolved_text_color(theme))
    }

    /// The raw text handed to a share target.
    pub fn share_text(&self) -> &str {
        &self.text
    }
}

/// A named, styled container for an ordered set of notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: String,
    pub name: String,
    /// Cover color
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_color_opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_color_opacity: Option<f32>,
    /// Notes in creation order, oldest first
    #[serde(default)]
    pub notes: Vec<Note>,
    pub created_at: DateTime<Utc>,
}

impl Notebook {
    /// Creates an empty notebook with a fresh id
    pub fn new(
        name: String,
        color: String,
        text_color: Option<String>,
        background_color: Option<String>,
    ) -> Self {
        Notebook {
            id: Uuid::new_v4().to_string(),
            name,
            color,
            text_color,
            background_color,
            cover_image: None,
            cover_image_opacity: None,
            cover_image_color: None,
            cover_image_color_opacity: None,
            background_image: None,
            background_image_opacity: None,
            background_image_color: None,
            background_image_color_opacity: None,
            notes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }

    pub fn resolved_background_color(&self, theme: &Theme) -> &str {
        self.background_color.as_deref().unwrap_or(theme.background)
    }

    pub fn resolved_text_color(&self, theme: &Theme) -> &str {
        self.text_color.as_deref().unwrap_or(theme.text)
    }

    /// Overlay drawn on the home-screen card.
    pub fn cover_overlay(&self) -> CosmeticOverlay {
        CosmeticOverlay {
            image: self.cover_image.clone(),
            image_opacity: self
                .cover_image_opacity
                .unwrap_or(DEFAULT_COVER_IMAGE_OPACITY),
            tint_color: self
                .cover_image_color
                .clone()
                .unwrap_or_else(|| DEFAULT_TINT_COLOR.to_string()),
            tint_opacity: self
                .cover_image_color_opacity
                .unwrap_or(DEFAULT_TINT_OPACITY),
        }
    }

    /// Overlay drawn on the notebook detail view.
    pub fn background_overlay(&self) -> CosmeticOverlay {
        CosmeticOverlay {
            image: self.background_image.clone(),
            image_opacity: self
                .background_image_opacity
                .unwrap_or(DEFAULT_BACKGROUND_IMAGE_OPACITY),
            tint_color: self
                .background_image_color
                .clone()
                .unwrap_or_else(|| DEFAULT_TINT_COLOR.to_string()),
            tint_opacity: self
                .background_image_color_opacity
                .unwrap_or(DEFAULT_TINT_OPACITY),
        }
    }

    /// Merges the supplied fields, leaving the rest untouched
    pub fn apply(&mut self, update: NotebookUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        merge(&mut self.text_color, update.text_color);
        merge(&mut self.background_color, update.background_color);
        merge(&mut self.cover_image, update.cover_image);
        merge(&mut self.cover_image_opacity, update.cover_image_opacity);
        merge(&mut self.cover_image_color, update.cover_image_color);
        merge(
            &mut self.cover_image_color_opacity,
            update.cover_image_color_opacity,
        );
        merge(&mut self.background_image, update.background_image);
        merge(
            &mut self.background_image_opacity,
            update.background_image_opacity,
        );
        merge(&mut self.background_image_color, update.background_image_color);
        merge(
            &mut self.background_image_color_opacity,
            update.background_image_color_opacity,
        );
    }
}

/// Partial update for a notebook.
///
/// For optional fields the outer `Option` says whether the field is supplied and
/// the inner one carries the new value, so `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotebookUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub text_color: Option<Option<String>>,
    pub background_color: Option<Option<String>>,
    pub cover_image: Option<Option<String>>,
    pub cover_image_opacity: Option<Option<f32>>,
    pub cover_image_color: Option<Option<String>>,
    pub cover_image_color_opacity: Option<Option<f32>>,
    pub background_image: Option<Option<String>>,
    pub background_image_opacity: Option<Option<f32>>,
    pub background_image_color: Option<Option<String>>,
    pub background_image_color_opacity: Option<Option<f32>>,
}

impl NotebookUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Partial update for a note; same supplied/cleared convention as [`NotebookUpdate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteUpdate {
    pub text: Option<String>,
    pub background_color: Option<Option<String>>,
    pub text_color: Option<Option<String>>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Note {
    pub fn apply(&mut self, update: NoteUpdate) {
        if let Some(text) = update.text {
            self.text = text;
        }
        merge(&mut self.background_color, update.background_color);
        merge(&mut self.text_color, update.text_color);
    }
}

fn merge<T>(field: &mut Option<T>, supplied: Option<Option<T>>) {
    if let Some(value) = supplied {
        *field = value;
    }
}

/// Global display preferences, not owned by any notebook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub dark_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_background_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_background_image_opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_background_color_opacity: Option<f32>,
}

impl Preferences {
    pub fn theme(&self) -> Theme {
        if self.dark_mode {
            Theme::DARK
        } else {
            Theme::LIGHT
        }
    }

    /// Overlay drawn behind the home-screen grid.
    pub fn home_overlay(&self) -> CosmeticOverlay {
        CosmeticOverlay {
            image: self.home_background_image.clone(),
            image_opacity: self
                .home_background_image_opacity
                .unwrap_or(DEFAULT_BACKGROUND_IMAGE_OPACITY),
            tint_color: self
                .home_background_color
                .clone()
                .unwrap_or_else(|| DEFAULT_TINT_COLOR.to_string()),
            tint_opacity: self
                .home_background_color_opacity
                .unwrap_or(DEFAULT_TINT_OPACITY),
        }
    }
}

/// First-run progress, kept apart from display preferences so that resetting
/// preferences does not bring back the privacy notice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Onboarding {
    pub has_accepted_privacy_policy: bool,
    pub has_completed_onboarding: bool,
}

impl Onboarding {
    /// The privacy notice is shown until it is accepted
    pub fn needs_privacy_policy(&self) -> bool {
        !self.has_accepted_privacy_policy
    }

    /// The introduction follows the privacy notice
    pub fn needs_introduction(&self) -> bool {
        self.has_accepted_privacy_policy && !self.has_completed_onboarding
    }
}

/// A background image plus tint, with every field resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmeticOverlay {
    pub image: Option<String>,
    pub image_opacity: f32,
    pub tint_color: String,
    pub tint_opacity: f32,
}

/// Fallback colors for the current light/dark mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub background: &'static str,
    pub text: &'static str,
    pub accent: &'static str,
    pub placeholder: &'static str,
}

impl Theme {
    pub const LIGHT: Theme = Theme {
        background: "#FFFBEB",
        text: "#1F2937",
        accent: "#F59E0B",
        placeholder: "#9CA3AF",
    };

    pub const DARK: Theme = Theme {
        background: "#121212",
        text: "#F9FAFB",
        accent: "#A855F7",
        placeholder: "#6B7280",
    };
}
