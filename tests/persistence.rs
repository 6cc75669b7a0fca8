use std::fs;
use std::time::Duration;

use notebooks::{
    JsonFileStorage, NoteUpdate, NotebookStore, NotebookUpdate, PersistPolicy, StoreSnapshot,
    NOTEBOOKS_KEY, ONBOARDING_KEY, PREFERENCES_KEY,
};
use tempfile::TempDir;

fn policy() -> PersistPolicy {
    PersistPolicy {
        max_attempts: 2,
        initial_backoff: Duration::from_millis(1),
    }
}

fn open(dir: &TempDir) -> NotebookStore<JsonFileStorage> {
    let mut store = NotebookStore::new(JsonFileStorage::new(dir.path()), policy());
    store.load();
    store
}

#[tokio::test]
async fn restart_restores_notebooks_and_preferences() {
    let dir = TempDir::new().unwrap();

    let before: StoreSnapshot = {
        let mut store = open(&dir);
        let trip = store
            .create_notebook("Trip Journal", "#FF0000", Some("#FFFFFF".into()), Some("#000000".into()))
            .await
            .unwrap();
        let recipes = store
            .create_notebook("Recipes", "#2A9D8F", None, None)
            .await
            .unwrap();

        let hello = store.add_note(&trip.id, "Hello").await.unwrap().unwrap();
        store.add_note(&trip.id, "Day two").await.unwrap();
        store.add_note(&recipes.id, "Pancakes").await.unwrap();

        store
            .update_note(
                &trip.id,
                &hello.id,
                NoteUpdate {
                    background_color: Some(Some("#E9C46A".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .update_notebook(
                &recipes.id,
                NotebookUpdate {
                    background_image: Some(Some("file:///kitchen.jpg".into())),
                    background_image_opacity: Some(Some(0.6)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        store.toggle_dark_mode().await.unwrap();
        store
            .set_home_background(Some("file:///home.jpg".into()))
            .await
            .unwrap();
        store.set_home_background_color_opacity(0.2).await.unwrap();

        store.snapshot()
    };

    let reopened = open(&dir);
    assert_eq!(reopened.snapshot(), before);
    assert_eq!(reopened.notebooks()[0].name, "Trip Journal");
    assert_eq!(reopened.notebooks()[0].notes[0].text, "Hello");
    assert!(reopened.preferences().dark_mode);
}

#[tokio::test]
async fn stored_files_use_stable_keys_and_camel_case() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    let nb = store
        .create_notebook("Trip Journal", "#FF0000", None, None)
        .await
        .unwrap();
    store.add_note(&nb.id, "Hello").await.unwrap();
    store.toggle_dark_mode().await.unwrap();

    let notebooks = fs::read_to_string(dir.path().join(format!("{}.json", NOTEBOOKS_KEY))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&notebooks).unwrap();
    assert_eq!(value[0]["name"], "Trip Journal");
    assert_eq!(value[0]["notes"][0]["text"], "Hello");
    assert!(value[0]["createdAt"].is_string());

    let prefs = fs::read_to_string(dir.path().join(format!("{}.json", PREFERENCES_KEY))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&prefs).unwrap();
    assert_eq!(value["darkMode"], true);
}

#[tokio::test]
async fn unreadable_files_start_fresh() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notebooks.json"), "{ broken").unwrap();
    fs::write(dir.path().join("preferences.json"), "42").unwrap();

    let mut store = open(&dir);
    assert!(store.notebooks().is_empty());
    assert!(!store.preferences().dark_mode);

    // The first write replaces the broken file
    store
        .create_notebook("Fresh", "#FFFFFF", None, None)
        .await
        .unwrap();
    assert_eq!(open(&dir).notebooks().len(), 1);
}

#[tokio::test]
async fn deleting_a_notebook_survives_restart() {
    let dir = TempDir::new().unwrap();
    let id = {
        let mut store = open(&dir);
        let nb = store.create_notebook("Temp", "#000", None, None).await.unwrap();
        store.add_note(&nb.id, "soon gone").await.unwrap();
        store.delete_notebook(&nb.id).await.unwrap();
        assert!(!store.delete_notebook(&nb.id).await.unwrap());
        nb.id
    };

    let reopened = open(&dir);
    assert!(reopened.notebook(&id).is_none());
    assert!(reopened.notebooks().is_empty());
}

#[tokio::test]
async fn onboarding_survives_restart_in_its_own_file() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = open(&dir);
        assert!(store.onboarding().needs_privacy_policy());
        store.accept_privacy_policy().await.unwrap();
    }

    let onboarding = fs::read_to_string(dir.path().join(format!("{}.json", ONBOARDING_KEY))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&onboarding).unwrap();
    assert_eq!(value["hasAcceptedPrivacyPolicy"], true);
    assert_eq!(value["hasCompletedOnboarding"], false);
    assert!(!dir.path().join(format!("{}.json", PREFERENCES_KEY)).exists());

    let mut store = open(&dir);
    assert!(store.onboarding().needs_introduction());
    store.complete_onboarding().await.unwrap();
    assert!(open(&dir).onboarding().has_completed_onboarding);
}
