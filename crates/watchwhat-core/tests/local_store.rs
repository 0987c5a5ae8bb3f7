use std::sync::Arc;
use tempfile::TempDir;
use watchwhat_core::{FileStorage, LocalPreferenceStore, StorageKey, StoragePort};
use watchwhat_models::{ContentKind, ContentSnapshot};

fn snapshot(id: u64, kind: ContentKind, title: &str) -> ContentSnapshot {
    ContentSnapshot {
        id,
        kind,
        title: title.to_string(),
        poster_path: Some(format!("/{}.jpg", id)),
        release_date: Some("2019-05-01".to_string()),
        vote_average: 8.1,
        genre_ids: vec![18, 9648],
    }
}

#[test]
fn export_from_disk_imports_into_fresh_store() {
    let source_dir = TempDir::new().unwrap();
    let source = LocalPreferenceStore::open(Arc::new(FileStorage::new(source_dir.path()).unwrap()));
    source.update(|p| {
        p.toggle_favorite_genre(18);
        p.add_favorite_actor(287);
        p.preferred_languages = vec!["en".to_string(), "de".to_string()];
    });
    source.add_favorite(snapshot(70523, ContentKind::Series, "Dark"));
    source.add_favorite(snapshot(603, ContentKind::Movie, "The Matrix"));
    source.add_watched(snapshot(1396, ContentKind::Series, "Breaking Bad"), Some(10.0), Some("Best".to_string()));

    let exported = source.export_json().unwrap();

    let target_dir = TempDir::new().unwrap();
    let target_storage = Arc::new(FileStorage::new(target_dir.path()).unwrap());
    let target = LocalPreferenceStore::open(target_storage.clone());
    target.import_json(&exported).unwrap();

    // Reopen from disk to make sure the import was persisted
    let reopened = LocalPreferenceStore::open(target_storage);
    assert_eq!(reopened.get(), source.get());
    assert_eq!(reopened.favorites(), source.favorites());
    assert_eq!(reopened.watched(), source.watched());
    assert_eq!(reopened.favorites()[0].content.title, "The Matrix");
}

#[test]
fn repeated_adds_store_a_single_entry() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    let store = LocalPreferenceStore::open(storage.clone());

    for _ in 0..3 {
        store.add_favorite(snapshot(1, ContentKind::Movie, "One"));
        store.add_watched(snapshot(1, ContentKind::Movie, "One"), None, None);
    }

    let raw = storage.read(StorageKey::FavoriteSeries).unwrap().unwrap();
    let stored: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(store.watched().len(), 1);
}

#[test]
fn stores_on_one_port_follow_each_other() {
    let dir = TempDir::new().unwrap();
    let storage: Arc<dyn StoragePort> = Arc::new(FileStorage::new(dir.path()).unwrap());
    let first = LocalPreferenceStore::open(storage.clone());
    let second = LocalPreferenceStore::open(storage.clone());
    let mut events = storage.subscribe();

    first.update(|p| p.min_rating = 4.0);
    second.update(|p| p.min_rating = 9.0);

    while let Ok(event) = events.try_recv() {
        first.handle_storage_event(&event);
        second.handle_storage_event(&event);
    }

    assert_eq!(first.get().min_rating, 9.0);
    assert_eq!(second.get().min_rating, 9.0);
}
