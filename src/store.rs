use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    decode_or_default, validate_notebooks, validate_snapshot, LoadState, Note, NoteUpdate,
    Notebook, NotebookError, NotebookUpdate, Onboarding, Preferences, Result, StateStorage,
    StoreEvent, StoreSnapshot, Theme,
};

/// Storage key holding the notebook collection
pub const NOTEBOOKS_KEY: &str = "notebooks";
/// Storage key holding the global preferences
pub const PREFERENCES_KEY: &str = "preferences";
/// Storage key holding first-run progress
pub const ONBOARDING_KEY: &str = "onboarding";

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How hard the store tries to write before reporting a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for every further retry
    pub initial_backoff: Duration,
}

impl Default for PersistPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
        }
    }
}

/// Owns all notebooks, their notes and the global preferences.
///
/// Every mutation is applied in memory, written to the injected [`StateStorage`]
/// and announced on the event channel. Unknown ids passed to update and delete
/// operations are ignored and reported as `Ok(false)`.
///
/// Mutations require a loaded store so that an empty in-memory state can never
/// overwrite data that has not been read yet.
pub struct NotebookStore<S: StateStorage> {
    /// Persistence backend
    storage: S,

    /// Notebooks in insertion order
    notebooks: Vec<Notebook>,

    preferences: Preferences,

    onboarding: Onboarding,

    policy: PersistPolicy,

    state: LoadState,

    /// Change notifications for observers
    events: broadcast::Sender<StoreEvent>,
}

impl<S: StateStorage> NotebookStore<S> {
    /// Creates an unloaded store on top of `storage`.
    ///
    /// Call [`NotebookStore::load`] before using it.
    pub fn new(storage: S, policy: PersistPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            notebooks: Vec::new(),
            preferences: Preferences::default(),
            onboarding: Onboarding::default(),
            policy,
            state: LoadState::NotLoaded,
            events,
        }
    }

    /// Rehydrates the state from storage.
    ///
    /// Missing or unreadable data is replaced by an empty collection and default
    /// preferences; this never fails. Returns the number of notebooks loaded.
    pub fn load(&mut self) -> usize {
        info!("Loading notebooks from storage");

        self.notebooks = decode_or_default(NOTEBOOKS_KEY, self.storage.read(NOTEBOOKS_KEY));
        self.preferences =
            decode_or_default(PREFERENCES_KEY, self.storage.read(PREFERENCES_KEY));
        self.onboarding = decode_or_default(ONBOARDING_KEY, self.storage.read(ONBOARDING_KEY));
        self.state = LoadState::Loaded;

        if let Err(e) = validate_notebooks(&self.notebooks) {
            warn!("Stored notebooks are inconsistent, export will refuse them: {}", e);
        }

        let count = self.notebooks.len();
        info!(
            "Loaded {} notebooks ({} notes), dark mode {}",
            count,
            self.notebooks.iter().map(|nb| nb.notes.len()).sum::<usize>(),
            if self.preferences.dark_mode { "on" } else { "off" }
        );
        self.emit(StoreEvent::Reloaded);
        count
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// Receives an event after every applied mutation
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// All notebooks in insertion order
    pub fn notebooks(&self) -> &[Notebook] {
        &self.notebooks
    }

    pub fn notebook(&self, id: &str) -> Option<&Notebook> {
        self.notebooks.iter().find(|nb| nb.id == id)
    }

    pub fn note_count(&self, id: &str) -> Option<usize> {
        self.notebook(id).map(|nb| nb.notes.len())
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn theme(&self) -> Theme {
        self.preferences.theme()
    }

    pub fn onboarding(&self) -> Onboarding {
        self.onboarding
    }

    /// Releases the backend, e.g. to reopen it in a fresh store
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Creates a notebook with no notes and appends it to the collection.
    ///
    /// `name` is stored as given; trimming and length checks belong to the caller.
    pub async fn create_notebook(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
        text_color: Option<String>,
        background_color: Option<String>,
    ) -> Result<Notebook> {
        self.ensure_loaded()?;

        let mut notebook = Notebook::new(name.into(), color.into(), text_color, background_color);
        while self.notebook(&notebook.id).is_some() {
            notebook.id = Uuid::new_v4().to_string();
        }

        info!("Creating notebook {} ({})", notebook.id, notebook.name);
        self.notebooks.push(notebook.clone());

        self.commit_notebooks(StoreEvent::NotebookCreated {
            id: notebook.id.clone(),
        })
        .await?;
        Ok(notebook)
    }

    /// Merges `update` into the notebook; `Ok(false)` when `id` is unknown
    pub async fn update_notebook(&mut self, id: &str, update: NotebookUpdate) -> Result<bool> {
        self.ensure_loaded()?;

        let Some(notebook) = self.notebooks.iter_mut().find(|nb| nb.id == id) else {
            debug!("Ignoring update for unknown notebook {}", id);
            return Ok(false);
        };

        trace!("Updating notebook {} with {:?}", id, update);
        notebook.apply(update);

        self.commit_notebooks(StoreEvent::NotebookUpdated { id: id.to_string() })
            .await?;
        Ok(true)
    }

    /// Removes the notebook together with all of its notes
    pub async fn delete_notebook(&mut self, id: &str) -> Result<bool> {
        self.ensure_loaded()?;

        let Some(index) = self.notebooks.iter().position(|nb| nb.id == id) else {
            debug!("Ignoring delete for unknown notebook {}", id);
            return Ok(false);
        };

        let removed = self.notebooks.remove(index);
        info!(
            "Deleted notebook {} ({}) with {} notes",
            removed.id,
            removed.name,
            removed.notes.len()
        );

        self.commit_notebooks(StoreEvent::NotebookDeleted { id: id.to_string() })
            .await?;
        Ok(true)
    }

    /// Appends a note to the notebook; `Ok(None)` when the notebook is unknown
    pub async fn add_note(&mut self, notebook_id: &str, text: impl Into<String>) -> Result<Option<Note>> {
        self.ensure_loaded()?;

        let text = text.into();
        if text.trim().is_empty() {
            return Err(NotebookError::InvalidInput {
                message: "Note text cannot be empty".to_string(),
            });
        }

        let mut note = Note::new(text);
        while self.note_id_taken(&note.id) {
            note.id = Uuid::new_v4().to_string();
        }

        let Some(notebook) = self.notebooks.iter_mut().find(|nb| nb.id == notebook_id) else {
            debug!("Ignoring note for unknown notebook {}", notebook_id);
            return Ok(None);
        };

        notebook.notes.push(note.clone());
        debug!(
            "Added note {} to notebook {} ({} notes)",
            note.id,
            notebook_id,
            notebook.notes.len()
        );

        self.commit_notebooks(StoreEvent::NoteAdded {
            notebook_id: notebook_id.to_string(),
            note_id: note.id.clone(),
        })
        .await?;
        Ok(Some(note))
    }

    /// Merges `update` into one note; `Ok(false)` when either id is unknown
    pub async fn update_note(
        &mut self,
        notebook_id: &str,
        note_id: &str,
        update: NoteUpdate,
    ) -> Result<bool> {
        self.ensure_loaded()?;

        if update.text.as_deref().is_some_and(|text| text.trim().is_empty()) {
            return Err(NotebookError::InvalidInput {
                message: "Note text cannot be empty".to_string(),
            });
        }

        let Some(note) = self
            .notebooks
            .iter_mut()
            .find(|nb| nb.id == notebook_id)
            .and_then(|nb| nb.notes.iter_mut().find(|note| note.id == note_id))
        else {
            debug!("Ignoring update for unknown note {}/{}", notebook_id, note_id);
            return Ok(false);
        };

        note.apply(update);

        self.commit_notebooks(StoreEvent::NoteUpdated {
            notebook_id: notebook_id.to_string(),
            note_id: note_id.to_string(),
        })
        .await?;
        Ok(true)
    }

    pub async fn delete_note(&mut self, notebook_id: &str, note_id: &str) -> Result<bool> {
        self.ensure_loaded()?;

        let Some(notebook) = self.notebooks.iter_mut().find(|nb| nb.id == notebook_id) else {
            debug!("Ignoring delete for note in unknown notebook {}", notebook_id);
            return Ok(false);
        };

        let before = notebook.notes.len();
        notebook.notes.retain(|note| note.id != note_id);
        if notebook.notes.len() == before {
            debug!("Ignoring delete for unknown note {}/{}", notebook_id, note_id);
            return Ok(false);
        }

        debug!("Deleted note {} from notebook {}", note_id, notebook_id);
        self.commit_notebooks(StoreEvent::NoteDeleted {
            notebook_id: notebook_id.to_string(),
            note_id: note_id.to_string(),
        })
        .await?;
        Ok(true)
    }

    /// Flips dark mode and returns the new value
    pub async fn toggle_dark_mode(&mut self) -> Result<bool> {
        self.ensure_loaded()?;
        self.preferences.dark_mode = !self.preferences.dark_mode;
        info!("Dark mode {}", if self.preferences.dark_mode { "on" } else { "off" });
        self.commit_preferences().await?;
        Ok(self.preferences.dark_mode)
    }

    pub async fn set_home_background(&mut self, uri: Option<String>) -> Result<()> {
        self.ensure_loaded()?;
        self.preferences.home_background_image = uri;
        self.commit_preferences().await
    }

    pub async fn set_home_background_opacity(&mut self, opacity: f32) -> Result<()> {
        self.ensure_loaded()?;
        self.preferences.home_background_image_opacity = Some(opacity);
        self.commit_preferences().await
    }

    pub async fn set_home_background_color(&mut self, color: impl Into<String>) -> Result<()> {
        self.ensure_loaded()?;
        self.preferences.home_background_color = Some(color.into());
        self.commit_preferences().await
    }

    pub async fn set_home_background_color_opacity(&mut self, opacity: f32) -> Result<()> {
        self.ensure_loaded()?;
        self.preferences.home_background_color_opacity = Some(opacity);
        self.commit_preferences().await
    }

    /// Puts every preference back to its first-run default
    pub async fn reset_preferences(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        self.preferences = Preferences::default();
        self.commit_preferences().await
    }

    pub async fn accept_privacy_policy(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        info!("Privacy policy accepted");
        self.onboarding.has_accepted_privacy_policy = true;
        self.commit_onboarding().await
    }

    /// Marks the introduction as seen; the privacy policy must be accepted first
    pub async fn complete_onboarding(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        if !self.onboarding.has_accepted_privacy_policy {
            return Err(NotebookError::InvalidInput {
                message: "Accept the privacy policy before completing onboarding".to_string(),
            });
        }
        info!("Onboarding completed");
        self.onboarding.has_completed_onboarding = true;
        self.commit_onboarding().await
    }

    /// The full state, suitable for export
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            notebooks: self.notebooks.clone(),
            preferences: self.preferences.clone(),
        }
    }

    /// Replaces the whole state with `snapshot` and persists both keys
    pub async fn restore(&mut self, snapshot: StoreSnapshot) -> Result<()> {
        self.ensure_loaded()?;
        validate_snapshot(&snapshot)?;

        info!(
            "Restoring snapshot with {} notebooks",
            snapshot.notebooks.len()
        );
        self.notebooks = snapshot.notebooks;
        self.preferences = snapshot.preferences;

        let notebooks = self.write_key(NOTEBOOKS_KEY).await;
        let preferences = self.write_key(PREFERENCES_KEY).await;
        self.emit(StoreEvent::Reloaded);
        notebooks.and(preferences)
    }

    fn ensure_loaded(&self) -> Result<()> {
        match self.state {
            LoadState::Loaded => Ok(()),
            LoadState::NotLoaded => Err(NotebookError::ApplicationError {
                message: "Notebook store used before it was loaded".to_string(),
            }),
        }
    }

    fn note_id_taken(&self, note_id: &str) -> bool {
        self.notebooks
            .iter()
            .any(|nb| nb.notes.iter().any(|note| note.id == note_id))
    }

    async fn commit_notebooks(&mut self, event: StoreEvent) -> Result<()> {
        let result = self.write_key(NOTEBOOKS_KEY).await;
        self.emit(event);
        result
    }

    async fn commit_preferences(&mut self) -> Result<()> {
        let result = self.write_key(PREFERENCES_KEY).await;
        self.emit(StoreEvent::PreferencesChanged);
        result
    }

    async fn commit_onboarding(&mut self) -> Result<()> {
        let result = self.write_key(ONBOARDING_KEY).await;
        self.emit(StoreEvent::OnboardingChanged);
        result
    }

    fn emit(&self, event: StoreEvent) {
        // No receivers is fine: nobody is observing
        let _ = self.events.send(event);
    }

    /// Serializes one key and writes it, retrying with exponential backoff.
    ///
    /// On final failure the in-memory state is kept; the next successful write of
    /// the same key brings storage up to date.
    async fn write_key(&mut self, key: &'static str) -> Result<()> {
        let value = match key {
            NOTEBOOKS_KEY => serde_json::to_string(&self.notebooks)?,
            ONBOARDING_KEY => serde_json::to_string(&self.onboarding)?,
            _ => serde_json::to_string(&self.preferences)?,
        };

        let max_attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.initial_backoff;
        let mut attempt = 1;

        loop {
            match self.storage.write(key, &value) {
                Ok(()) => {
                    trace!("Persisted '{}' on attempt {}", key, attempt);
                    return Ok(());
                }
                Err(e) if attempt < max_attempts => {
                    warn!(
                        "Write of '{}' failed (attempt {}/{}), retrying in {:?}: {}",
                        key, attempt, max_attempts, backoff, e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "Giving up on '{}' after {} attempts, changes are kept in memory only: {}",
                        key, attempt, e
                    );
                    return Err(NotebookError::PersistFailed {
                        key: key.to_string(),
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    fn quick_policy() -> PersistPolicy {
        PersistPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
        }
    }

    fn loaded_store() -> NotebookStore<MemoryStorage> {
        let mut store = NotebookStore::new(MemoryStorage::new(), quick_policy());
        store.load();
        store
    }

    fn reopen(store: NotebookStore<MemoryStorage>) -> NotebookStore<MemoryStorage> {
        let mut reopened = NotebookStore::new(store.into_storage(), quick_policy());
        reopened.load();
        reopened
    }

    #[tokio::test]
    async fn create_notebook_starts_empty_with_unique_id() {
        let mut store = loaded_store();
        let first = store
            .create_notebook("Trip Journal", "#FF0000", None, None)
            .await
            .unwrap();
        let second = store
            .create_notebook("Trip Journal", "#FF0000", None, None)
            .await
            .unwrap();

        assert!(first.notes.is_empty());
        assert_eq!(first.name, "Trip Journal");
        assert_eq!(first.color, "#FF0000");
        assert_ne!(first.id, second.id);
        assert_eq!(store.notebooks().len(), 2);
        assert_eq!(store.notebooks()[0].id, first.id);
    }

    #[tokio::test]
    async fn add_note_appends_one_note() {
        let mut store = loaded_store();
        let nb = store
            .create_notebook("Trip Journal", "#FF0000", None, None)
            .await
            .unwrap();

        let note = store.add_note(&nb.id, "Hello").await.unwrap().unwrap();
        assert_eq!(store.note_count(&nb.id), Some(1));

        let stored = store.notebook(&nb.id).unwrap();
        assert_eq!(stored.notes.len(), 1);
        assert_eq!(stored.notes[0].text, "Hello");
        assert_eq!(stored.notes[0], note);

        let later = store.add_note(&nb.id, "World").await.unwrap().unwrap();
        let stored = store.notebook(&nb.id).unwrap();
        assert_eq!(stored.notes.last().unwrap().id, later.id);
        assert!(stored.notes[0].created_at <= stored.notes[1].created_at);
    }

    #[tokio::test]
    async fn add_note_rejects_empty_text_and_ignores_unknown_notebook() {
        let mut store = loaded_store();
        let nb = store.create_notebook("A", "#fff", None, None).await.unwrap();

        assert!(matches!(
            store.add_note(&nb.id, "   ").await,
            Err(NotebookError::InvalidInput { .. })
        ));
        assert_eq!(store.add_note("missing", "Hello").await.unwrap(), None);
        assert_eq!(store.note_count(&nb.id), Some(0));
    }

    #[tokio::test]
    async fn update_note_rejects_blank_text_before_changing_anything() {
        let mut store = loaded_store();
        let nb = store.create_notebook("A", "#fff", None, None).await.unwrap();
        let note = store.add_note(&nb.id, "kept").await.unwrap().unwrap();

        let update = NoteUpdate {
            text: Some("   ".to_string()),
            text_color: Some(Some("#E63946".to_string())),
            ..Default::default()
        };
        assert!(matches!(
            store.update_note(&nb.id, &note.id, update).await,
            Err(NotebookError::InvalidInput { .. })
        ));
        assert_eq!(store.notebook(&nb.id).unwrap().note(&note.id), Some(&note));

        let snapshot = store.snapshot();
        store.restore(snapshot).await.unwrap();
    }

    #[tokio::test]
    async fn delete_notebook_cascades_and_is_idempotent() {
        let mut store = loaded_store();
        let nb = store.create_notebook("A", "#fff", None, None).await.unwrap();
        let keep = store.create_notebook("B", "#000", None, None).await.unwrap();
        let note = store.add_note(&nb.id, "gone").await.unwrap().unwrap();

        assert!(store.delete_notebook(&nb.id).await.unwrap());
        assert!(store.notebook(&nb.id).is_none());
        assert!(!store.note_id_taken(&note.id));
        assert!(!store.delete_notebook(&nb.id).await.unwrap());

        let ids: Vec<_> = store.notebooks().iter().map(|nb| nb.id.clone()).collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[tokio::test]
    async fn update_notebook_changes_only_supplied_fields() {
        let mut store = loaded_store();
        let nb = store
            .create_notebook("Old", "#FF0000", Some("#FFFFFF".into()), Some("#000000".into()))
            .await
            .unwrap();
        store.add_note(&nb.id, "kept").await.unwrap();
        let before = serde_json::to_value(store.notebook(&nb.id).unwrap()).unwrap();

        assert!(store
            .update_notebook(&nb.id, NotebookUpdate::name("New Name"))
            .await
            .unwrap());

        let mut after = serde_json::to_value(store.notebook(&nb.id).unwrap()).unwrap();
        assert_eq!(after["name"], "New Name");
        after["name"] = before["name"].clone();
        assert_eq!(after, before);

        assert!(!store
            .update_notebook("missing", NotebookUpdate::name("x"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn update_and_delete_note() {
        let mut store = loaded_store();
        let nb = store.create_notebook("A", "#fff", None, None).await.unwrap();
        let note = store.add_note(&nb.id, "draft").await.unwrap().unwrap();

        let update = NoteUpdate {
            text: Some("final".to_string()),
            text_color: Some(Some("#E63946".to_string())),
            ..Default::default()
        };
        assert!(store.update_note(&nb.id, &note.id, update.clone()).await.unwrap());
        let stored = store.notebook(&nb.id).unwrap().note(&note.id).unwrap();
        assert_eq!(stored.text, "final");
        assert_eq!(stored.text_color.as_deref(), Some("#E63946"));
        assert_eq!(stored.created_at, note.created_at);

        assert!(!store.update_note("missing", &note.id, update.clone()).await.unwrap());
        assert!(!store.update_note(&nb.id, "missing", update).await.unwrap());

        assert!(!store.delete_note(&nb.id, "missing").await.unwrap());
        assert!(store.delete_note(&nb.id, &note.id).await.unwrap());
        assert!(!store.delete_note(&nb.id, &note.id).await.unwrap());
        assert_eq!(store.note_count(&nb.id), Some(0));
    }

    #[tokio::test]
    async fn preferences_are_set_and_reset() {
        let mut store = loaded_store();
        assert!(store.toggle_dark_mode().await.unwrap());
        assert_eq!(store.theme(), Theme::DARK);
        store
            .set_home_background(Some("file:///home.jpg".into()))
            .await
            .unwrap();
        store.set_home_background_opacity(0.0).await.unwrap();
        store.set_home_background_color("#8338EC").await.unwrap();
        store.set_home_background_color_opacity(0.25).await.unwrap();

        let overlay = store.preferences().home_overlay();
        assert_eq!(overlay.image.as_deref(), Some("file:///home.jpg"));
        assert_eq!(overlay.image_opacity, 0.0);
        assert_eq!(overlay.tint_color, "#8338EC");
        assert_eq!(overlay.tint_opacity, 0.25);

        store.set_home_background(None).await.unwrap();
        assert_eq!(store.preferences().home_background_image, None);

        store.reset_preferences().await.unwrap();
        assert_eq!(store.preferences(), &Preferences::default());
    }

    #[tokio::test]
    async fn onboarding_progress_is_persisted_separately() {
        let mut store = loaded_store();
        assert_eq!(store.onboarding(), Onboarding::default());

        assert!(matches!(
            store.complete_onboarding().await,
            Err(NotebookError::InvalidInput { .. })
        ));
        store.accept_privacy_policy().await.unwrap();
        assert!(store.onboarding().needs_introduction());
        store.complete_onboarding().await.unwrap();

        store.reset_preferences().await.unwrap();
        let reopened = reopen(store);
        assert_eq!(
            reopened.onboarding(),
            Onboarding {
                has_accepted_privacy_policy: true,
                has_completed_onboarding: true,
            }
        );
    }

    #[tokio::test]
    async fn inconsistent_stored_notebooks_still_load() {
        let mut notebook = Notebook::new("A".to_string(), "#fff".to_string(), None, None);
        notebook.notes.push(Note::new(" ".to_string()));
        let mut storage = MemoryStorage::new();
        storage.insert(NOTEBOOKS_KEY, &serde_json::to_string(&[notebook]).unwrap());

        let mut store = NotebookStore::new(storage, quick_policy());
        assert_eq!(store.load(), 1);
        assert_eq!(store.notebooks()[0].notes.len(), 1);
    }

    #[tokio::test]
    async fn reload_restores_exact_state() {
        let mut store = loaded_store();
        let a = store.create_notebook("A", "#fff", None, None).await.unwrap();
        let b = store.create_notebook("B", "#000", None, None).await.unwrap();
        store.add_note(&b.id, "one").await.unwrap();
        store.add_note(&b.id, "two").await.unwrap();
        store
            .update_notebook(
                &a.id,
                NotebookUpdate {
                    cover_image: Some(Some("file:///c.png".into())),
                    cover_image_opacity: Some(Some(0.4)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store.toggle_dark_mode().await.unwrap();
        let before = store.snapshot();

        let reopened = reopen(store);
        assert_eq!(reopened.snapshot(), before);
        let texts: Vec<_> = reopened.notebooks()[1]
            .notes
            .iter()
            .map(|n| n.text.as_str())
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn corrupt_storage_loads_as_empty() {
        let mut storage = MemoryStorage::new();
        storage.insert(NOTEBOOKS_KEY, "not json");
        storage.insert(PREFERENCES_KEY, "[]");
        let mut store = NotebookStore::new(storage, quick_policy());
        assert_eq!(store.load_state(), LoadState::NotLoaded);
        assert_eq!(store.load(), 0);
        assert!(store.is_loaded());
        assert_eq!(store.preferences(), &Preferences::default());
    }

    #[tokio::test]
    async fn mutations_require_load() {
        let mut store = NotebookStore::new(MemoryStorage::new(), quick_policy());
        assert!(matches!(
            store.create_notebook("A", "#fff", None, None).await,
            Err(NotebookError::ApplicationError { .. })
        ));
    }

    #[tokio::test]
    async fn transient_write_failures_are_retried() {
        let mut storage = MemoryStorage::new();
        storage.fail_next_writes(2);
        let mut store = NotebookStore::new(storage, quick_policy());
        store.load();

        let nb = store.create_notebook("A", "#fff", None, None).await.unwrap();
        let reopened = reopen(store);
        assert!(reopened.notebook(&nb.id).is_some());
    }

    #[tokio::test]
    async fn persistent_write_failure_keeps_memory_and_catches_up() {
        let mut storage = MemoryStorage::new();
        storage.fail_next_writes(3);
        let mut store = NotebookStore::new(storage, quick_policy());
        store.load();

        let result = store.create_notebook("A", "#fff", None, None).await;
        assert!(matches!(
            result,
            Err(NotebookError::PersistFailed { attempts: 3, .. })
        ));
        assert_eq!(store.notebooks().len(), 1);

        store.create_notebook("B", "#000", None, None).await.unwrap();
        let reopened = reopen(store);
        assert_eq!(reopened.notebooks().len(), 2);
    }

    #[tokio::test]
    async fn observers_receive_events() {
        let mut store = loaded_store();
        let mut events = store.subscribe();

        let nb = store.create_notebook("A", "#fff", None, None).await.unwrap();
        let note = store.add_note(&nb.id, "hi").await.unwrap().unwrap();
        store.update_notebook("missing", NotebookUpdate::name("x")).await.unwrap();
        store.toggle_dark_mode().await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::NotebookCreated { id: nb.id.clone() }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::NoteAdded {
                notebook_id: nb.id,
                note_id: note.id
            }
        );
        assert_eq!(events.recv().await.unwrap(), StoreEvent::PreferencesChanged);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn snapshot_json_round_trip_preserves_order() {
        let mut store = loaded_store();
        for name in ["first", "second", "third"] {
            let nb = store.create_notebook(name, "#fff", None, None).await.unwrap();
            store.add_note(&nb.id, format!("{name} a")).await.unwrap();
            store.add_note(&nb.id, format!("{name} b")).await.unwrap();
        }
        store.set_home_background_color("#06D6A0").await.unwrap();

        let snapshot = store.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: StoreSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, snapshot);

        let mut other = loaded_store();
        other.restore(decoded).await.unwrap();
        let names: Vec<_> = other.notebooks().iter().map(|nb| nb.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(reopen(other).snapshot(), snapshot);
    }
}
