//! CLI module for the notebooks application
//!
//! This module turns parsed commands into notebook store operations and prints
//! the results.
use std::{
    fs,
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    hsl_to_hex_with_alpha, load_snapshot_from_file, normalize_notebook_name, parse_color,
    parse_opacity, Commands, Config, ImportSummary, NoteUpdate, Notebook, NotebookError,
    NotebookStore, NotebookUpdate, Result, StateStorage, VoiceInput, CRAYON_COLORS,
};

/// CLI Application handler - processes CLI commands against the notebook store
pub struct App<S: StateStorage> {
    /// The loaded notebook store
    store: NotebookStore<S>,

    /// Application configuration
    config: Config,

    /// Where `config --reset` writes
    config_path: Option<PathBuf>,

    voice: VoiceInput,

    /// Whether to display verbose output
    verbose: bool,
}

impl<S: StateStorage> App<S> {
    /// Create a new CLI application around a loaded store
    pub fn new(
        store: NotebookStore<S>,
        config: Config,
        config_path: Option<PathBuf>,
        voice: VoiceInput,
        verbose: bool,
    ) -> Self {
        Self {
            store,
            config,
            config_path,
            voice,
            verbose,
        }
    }

    pub fn store(&self) -> &NotebookStore<S> {
        &self.store
    }

    /// Run the CLI application with the given command
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        if let Some(notice) = self.first_run_notice(&command) {
            eprintln!("{}", console::style(notice).yellow());
        }

        match command {
            Commands::Create {
                name,
                color,
                text_color,
                background_color,
            } => {
                let notebook = self
                    .create_notebook(&name, color, &text_color, &background_color)
                    .await?;
                println!("Notebook created with ID: {}", notebook.id);
            }

            Commands::List { json } => self.list_notebooks(json)?,

            Commands::Show { id, json } => self.show_notebook(&id, json)?,

            Commands::Update {
                id,
                name,
                color,
                text_color,
                background_color,
                cover_image,
                clear_cover_image,
                cover_image_opacity,
                cover_image_color,
                cover_image_color_opacity,
                background_image,
                clear_background_image,
                background_image_opacity,
                background_image_color,
                background_image_color_opacity,
            } => {
                let update = NotebookUpdate {
                    name: name.as_deref().map(normalize_notebook_name).transpose()?,
                    color: color.as_deref().map(parse_color).transpose()?,
                    text_color: supplied_color(text_color)?,
                    background_color: supplied_color(background_color)?,
                    cover_image: supplied_image(cover_image, clear_cover_image),
                    cover_image_opacity: supplied_opacity(cover_image_opacity)?,
                    cover_image_color: supplied_color(cover_image_color)?,
                    cover_image_color_opacity: supplied_opacity(cover_image_color_opacity)?,
                    background_image: supplied_image(background_image, clear_background_image),
                    background_image_opacity: supplied_opacity(background_image_opacity)?,
                    background_image_color: supplied_color(background_image_color)?,
                    background_image_color_opacity: supplied_opacity(
                        background_image_color_opacity,
                    )?,
                };
                self.update_notebook(&id, update).await?;
                println!("Notebook {} updated successfully", id);
            }

            Commands::Delete { id, force } => self.handle_delete(&id, force).await?,

            Commands::AddNote {
                notebook_id,
                text,
                audio,
            } => self.add_note(&notebook_id, text, audio).await?,

            Commands::EditNote {
                notebook_id,
                note_id,
                text,
                background_color,
                text_color,
            } => {
                let update = NoteUpdate {
                    text: text.map(|t| t.trim().to_string()),
                    background_color: supplied_color(background_color)?,
                    text_color: supplied_color(text_color)?,
                };
                self.edit_note(&notebook_id, &note_id, update).await?;
                println!("Note {} updated successfully", note_id);
            }

            Commands::DeleteNote {
                notebook_id,
                note_id,
                force,
            } => self.handle_delete_note(&notebook_id, &note_id, force).await?,

            Commands::Share {
                notebook_id,
                note_id,
            } => {
                let notebook = self.require_notebook(&notebook_id)?;
                let note = notebook
                    .note(&note_id)
                    .ok_or_else(|| NotebookError::NoteNotFound {
                        notebook_id: notebook_id.clone(),
                        note_id: note_id.clone(),
                    })?;
                println!("{}", note.share_text());
            }

            Commands::DarkMode => {
                let enabled = self.store.toggle_dark_mode().await?;
                println!("Dark mode {}", if enabled { "enabled" } else { "disabled" });
            }

            Commands::HomeBackground {
                image,
                clear_image,
                opacity,
                color,
                color_opacity,
            } => {
                self.set_home_background(image, clear_image, opacity, color, color_opacity)
                    .await?
            }

            Commands::Onboarding {
                accept_privacy_policy,
                complete,
            } => self.handle_onboarding(accept_privacy_policy, complete).await?,

            Commands::Color {
                hue,
                saturation,
                lightness,
                alpha,
            } => {
                println!("{}", hsl_to_hex_with_alpha(hue, saturation, lightness, alpha));
            }

            Commands::Export { output } => {
                let count = self.export(&output)?;
                println!("Exported {} notebooks to {}", count, output.display());
            }

            Commands::Import { source, force } => {
                if !force
                    && self.config.confirm_deletes
                    && !confirm("This replaces all notebooks and preferences. Continue?")?
                {
                    println!("Import cancelled.");
                    return Ok(());
                }
                let summary = self.import(&source).await?;
                println!(
                    "Imported {} notebooks with {} notes from {}",
                    summary.notebooks,
                    summary.notes,
                    summary.source.display()
                );
            }

            Commands::Config { show, reset } => self.handle_config(show, reset)?,
        }

        Ok(())
    }

    async fn create_notebook(
        &mut self,
        name: &str,
        color: Option<String>,
        text_color: &str,
        background_color: &str,
    ) -> Result<Notebook> {
        let name = normalize_notebook_name(name)?;
        let color = match color {
            Some(color) => parse_color(&color)?,
            None => CRAYON_COLORS[0].to_string(),
        };
        let text_color = parse_color(text_color)?;
        let background_color = parse_color(background_color)?;

        self.store
            .create_notebook(name, color, Some(text_color), Some(background_color))
            .await
    }

    async fn update_notebook(&mut self, id: &str, update: NotebookUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(NotebookError::InvalidInput {
                message: "Nothing to update".to_string(),
            });
        }
        if !self.store.update_notebook(id, update).await? {
            return Err(NotebookError::NotebookNotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn add_note(
        &mut self,
        notebook_id: &str,
        text: Option<String>,
        audio: Option<PathBuf>,
    ) -> Result<()> {
        let text = match (text, audio) {
            (Some(text), _) => text,
            (None, Some(audio)) => self.transcribe(&audio)?,
            (None, None) => {
                return Err(NotebookError::InvalidInput {
                    message: "Provide note text or --audio".to_string(),
                })
            }
        };

        match self.store.add_note(notebook_id, text.trim()).await? {
            Some(note) => {
                println!("Note created with ID: {}", note.id);
                Ok(())
            }
            None => Err(NotebookError::NotebookNotFound {
                id: notebook_id.to_string(),
            }),
        }
    }

    fn transcribe(&mut self, audio: &Path) -> Result<String> {
        if !self.voice.is_ready() {
            let model = self.config.speech_model_path.clone();
            self.voice.initialize(model.as_deref());
        }
        self.voice
            .transcribe(audio)
            .ok_or_else(|| NotebookError::ApplicationError {
                message: "Voice input is not available on this system".to_string(),
            })
    }

    async fn edit_note(&mut self, notebook_id: &str, note_id: &str, update: NoteUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(NotebookError::InvalidInput {
                message: "Nothing to update".to_string(),
            });
        }
        if !self.store.update_note(notebook_id, note_id, update).await? {
            return Err(self.missing_note(notebook_id, note_id));
        }
        Ok(())
    }

    async fn handle_delete(&mut self, id: &str, force: bool) -> Result<()> {
        let notebook = self.require_notebook(id)?.clone();

        if !force && self.config.confirm_deletes {
            println!("You are about to delete the following notebook:");
            println!("ID:      {}", notebook.id);
            println!("Name:    {}", notebook.name);
            println!("Notes:   {}", notebook.notes.len());
            println!("Created: {}", notebook.created_at.format("%Y-%m-%d %H:%M:%S"));
            println!("\nThis will delete all notes inside and cannot be undone!");
            if !confirm("Are you sure you want to delete this notebook?")? {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.store.delete_notebook(id).await?;
        println!(
            "Notebook '{}' ({}) has been permanently deleted.",
            notebook.name, notebook.id
        );
        Ok(())
    }

    async fn handle_delete_note(&mut self, notebook_id: &str, note_id: &str, force: bool) -> Result<()> {
        let preview = {
            let notebook = self.require_notebook(notebook_id)?;
            match notebook.note(note_id) {
                Some(note) => content_preview(&note.text, 60),
                None => return Err(self.missing_note(notebook_id, note_id)),
            }
        };

        if !force && self.config.confirm_deletes {
            println!("Note: {}", preview);
            if !confirm("Are you sure you want to delete this note?")? {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.store.delete_note(notebook_id, note_id).await?;
        println!("Note {} has been deleted.", note_id);
        Ok(())
    }

    async fn set_home_background(
        &mut self,
        image: Option<String>,
        clear_image: bool,
        opacity: Option<f32>,
        color: Option<String>,
        color_opacity: Option<f32>,
    ) -> Result<()> {
        let opacity = opacity.map(parse_opacity).transpose()?;
        let color = color.as_deref().map(parse_color).transpose()?;
        let color_opacity = color_opacity.map(parse_opacity).transpose()?;
        let mut changed = false;

        if clear_image {
            self.store.set_home_background(None).await?;
            changed = true;
        } else if let Some(image) = image {
            self.store.set_home_background(Some(image)).await?;
            changed = true;
        }
        if let Some(opacity) = opacity {
            self.store.set_home_background_opacity(opacity).await?;
            changed = true;
        }
        if let Some(color) = color {
            self.store.set_home_background_color(color).await?;
            changed = true;
        }
        if let Some(color_opacity) = color_opacity {
            self.store
                .set_home_background_color_opacity(color_opacity)
                .await?;
            changed = true;
        }

        if changed {
            println!("Home background updated");
        }
        let overlay = self.store.preferences().home_overlay();
        println!(
            "Image: {} ({:.0}%) | Tint: {} ({:.0}%)",
            overlay.image.as_deref().unwrap_or("none"),
            overlay.image_opacity * 100.0,
            overlay.tint_color,
            overlay.tint_opacity * 100.0
        );
        Ok(())
    }

    async fn handle_onboarding(&mut self, accept_privacy_policy: bool, complete: bool) -> Result<()> {
        if accept_privacy_policy {
            self.store.accept_privacy_policy().await?;
            println!("Privacy policy accepted.");
        }
        if complete {
            self.store.complete_onboarding().await?;
            println!("Onboarding complete.");
        }

        let onboarding = self.store.onboarding();
        println!(
            "Privacy policy: {} | Introduction: {}",
            if onboarding.has_accepted_privacy_policy { "accepted" } else { "pending" },
            if onboarding.has_completed_onboarding { "done" } else { "pending" }
        );
        Ok(())
    }

    /// Reminder printed before other commands until onboarding is finished
    fn first_run_notice(&self, command: &Commands) -> Option<&'static str> {
        if matches!(command, Commands::Onboarding { .. }) {
            return None;
        }
        let onboarding = self.store.onboarding();
        if onboarding.needs_privacy_policy() {
            Some("Notes are stored only on this device. Run `notebooks onboarding --accept-privacy-policy` to accept the privacy policy.")
        } else if onboarding.needs_introduction() {
            Some("New here? Run `notebooks onboarding --complete` once you have looked around.")
        } else {
            None
        }
    }

    /// Writes the full snapshot to `output`, returning the notebook count
    fn export(&self, output: &Path) -> Result<usize> {
        let snapshot = self.store.snapshot();
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|_| NotebookError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
        fs::write(output, serde_json::to_string_pretty(&snapshot)?)?;
        info!("Exported snapshot to {}", output.display());
        Ok(snapshot.notebooks.len())
    }

    async fn import(&mut self, source: &Path) -> Result<ImportSummary> {
        if !source.is_file() {
            return Err(NotebookError::InvalidInput {
                message: format!("Snapshot file not found: {}", source.display()),
            });
        }
        let snapshot = load_snapshot_from_file(source)?;
        let summary = ImportSummary {
            source: source.to_path_buf(),
            notebooks: snapshot.notebooks.len(),
            notes: snapshot.notebooks.iter().map(|nb| nb.notes.len()).sum(),
        };
        self.store.restore(snapshot).await?;
        Ok(summary)
    }

    fn handle_config(&mut self, show: bool, reset: bool) -> Result<()> {
        if reset {
            let path = self
                .config_path
                .clone()
                .or_else(Config::default_path)
                .ok_or_else(|| NotebookError::ConfigError {
                    message: "No configuration path available".to_string(),
                })?;
            self.config = Config::default();
            self.config.save(&path)?;
            println!("Configuration reset to defaults at {}", path.display());
        }
        if show || !reset {
            println!("{}", serde_json::to_string_pretty(&self.config)?);
        }
        Ok(())
    }

    /// List all notebooks in insertion order
    fn list_notebooks(&self, json: bool) -> Result<()> {
        let notebooks = self.store.notebooks();

        if json {
            let summaries: Vec<serde_json::Value> = notebooks
                .iter()
                .map(|nb| {
                    serde_json::json!({
                        "id": nb.id,
                        "name": nb.name,
                        "color": nb.color,
                        "noteCount": nb.notes.len(),
                        "createdAt": nb.created_at.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            return Ok(());
        }

        if notebooks.is_empty() {
            println!("No notebooks yet. Create one with `notebooks create <name>`.");
            return Ok(());
        }

        for notebook in notebooks {
            println!("{}", notebook_summary(notebook));
        }
        println!(
            "\n{} notebook{}",
            notebooks.len(),
            if notebooks.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    fn show_notebook(&self, id: &str, json: bool) -> Result<()> {
        let notebook = self.require_notebook(id)?;

        if json {
            println!("{}", serde_json::to_string_pretty(notebook)?);
            return Ok(());
        }

        let theme = self.store.theme();
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        println!("{}", console::style(&notebook.name).bold());
        println!("ID: {} | Cover: {}", notebook.id, notebook.color);
        println!(
            "Text: {} | Background: {}",
            notebook.resolved_text_color(&theme),
            notebook.resolved_background_color(&theme)
        );
        if self.verbose {
            let cover = notebook.cover_overlay();
            let background = notebook.background_overlay();
            println!(
                "Cover overlay: {} ({:.0}%), tint {} ({:.0}%)",
                cover.image.as_deref().unwrap_or("none"),
                cover.image_opacity * 100.0,
                cover.tint_color,
                cover.tint_opacity * 100.0
            );
            println!(
                "Background overlay: {} ({:.0}%), tint {} ({:.0}%)",
                background.image.as_deref().unwrap_or("none"),
                background.image_opacity * 100.0,
                background.tint_color,
                background.tint_opacity * 100.0
            );
        }

        if notebook.notes.is_empty() {
            println!("\nNo notes yet.");
            return Ok(());
        }

        for note in &notebook.notes {
            println!("{}", "-".repeat(term_width.min(50)));
            println!(
                "{} | {}",
                console::style(&note.id).dim(),
                note.created_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
            );
            debug!(
                "Note {} colors: text {}, background {}",
                note.id,
                note.resolved_text_color(notebook, &theme),
                note.resolved_background_color(notebook)
            );
            println!("{}", note.text);
        }
        println!(
            "\n{} {}",
            notebook.notes.len(),
            if notebook.notes.len() == 1 { "note" } else { "notes" }
        );
        Ok(())
    }

    fn require_notebook(&self, id: &str) -> Result<&Notebook> {
        self.store
            .notebook(id)
            .ok_or_else(|| NotebookError::NotebookNotFound { id: id.to_string() })
    }

    fn missing_note(&self, notebook_id: &str, note_id: &str) -> NotebookError {
        if self.store.notebook(notebook_id).is_none() {
            NotebookError::NotebookNotFound {
                id: notebook_id.to_string(),
            }
        } else {
            NotebookError::NoteNotFound {
                notebook_id: notebook_id.to_string(),
                note_id: note_id.to_string(),
            }
        }
    }
}

/// One-line listing entry, e.g. `<id> | Trip Journal | 3 notes`
pub fn notebook_summary(notebook: &Notebook) -> String {
    let count = notebook.notes.len();
    format!(
        "{} | {} | {} {}",
        notebook.id,
        console::style(&notebook.name).bold(),
        count,
        if count == 1 { "note" } else { "notes" }
    )
}

/// First non-empty line, cut to `max_len` characters
fn content_preview(content: &str, max_len: usize) -> String {
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

fn supplied_color(value: Option<String>) -> Result<Option<Option<String>>> {
    value
        .as_deref()
        .map(|color| parse_color(color).map(Some))
        .transpose()
}

fn supplied_opacity(value: Option<f32>) -> Result<Option<Option<f32>>> {
    value
        .map(|opacity| parse_opacity(opacity).map(Some))
        .transpose()
}

fn supplied_image(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    stdout().flush().map_err(NotebookError::Io)?;

    let mut input = String::new();
    stdin().read_line(&mut input).map_err(NotebookError::Io)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
