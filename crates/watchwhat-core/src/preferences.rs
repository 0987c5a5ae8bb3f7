use crate::storage::{StorageError, StorageEvent, StorageKey, StoragePort, WriterId};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use watchwhat_models::{is_valid_score, ContentSnapshot, ExportBundle, FavoriteItem, Preferences, WatchedItem};

static NEXT_WRITER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Import data is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Import data is missing '{0}'")]
    MissingField(&'static str),

    #[error("Invalid '{field}' in import data: {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default)]
struct Mirror {
    preferences: Preferences,
    watched: Vec<WatchedItem>,
    favorites: Vec<FavoriteItem>,
    onboarding_completed: bool,
}

impl Mirror {
    fn reset(&mut self, key: StorageKey) {
        match key {
            StorageKey::Preferences => self.preferences = Preferences::default(),
            StorageKey::WatchedSeries => self.watched.clear(),
            StorageKey::FavoriteSeries => self.favorites.clear(),
            StorageKey::OnboardingCompleted => self.onboarding_completed = false,
        }
    }
}

/// Preferences, favorites, watched history and the onboarding flag of the
/// local user.
///
/// All collections live in an in-memory mirror; every mutation updates the
/// mirror under its lock and then flushes the affected key to storage. Flush
/// failures are logged and otherwise ignored, the mirror stays authoritative
/// for this instance.
pub struct LocalPreferenceStore {
    port: Arc<dyn StoragePort>,
    id: WriterId,
    mirror: Mutex<Mirror>,
}

impl LocalPreferenceStore {
    pub fn open(port: Arc<dyn StoragePort>) -> Self {
        let mirror = Mirror {
            preferences: load_preferences(port.as_ref()),
            watched: load_list(port.as_ref(), StorageKey::WatchedSeries),
            favorites: load_list(port.as_ref(), StorageKey::FavoriteSeries),
            onboarding_completed: load_flag(port.as_ref(), StorageKey::OnboardingCompleted),
        };
        info!(
            "Loaded local data: {} watched, {} favorites",
            mirror.watched.len(),
            mirror.favorites.len()
        );

        Self {
            port,
            id: NEXT_WRITER_ID.fetch_add(1, Ordering::Relaxed),
            mirror: Mutex::new(mirror),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Mirror> {
        self.mirror.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.port.write(key, &json, self.id) {
            warn!("Failed to persist {}: {}", key, e);
        }
    }

    // Preferences

    pub fn get(&self) -> Preferences {
        self.lock().preferences.clone()
    }

    pub fn save(&self, preferences: Preferences) {
        let mut mirror = self.lock();
        mirror.preferences = preferences;
        self.flush(StorageKey::Preferences, &mirror.preferences);
    }

    /// Read-modify-write of the preferences under the store lock
    pub fn update<F>(&self, f: F) -> Preferences
    where
        F: FnOnce(&mut Preferences),
    {
        let mut mirror = self.lock();
        f(&mut mirror.preferences);
        self.flush(StorageKey::Preferences, &mirror.preferences);
        mirror.preferences.clone()
    }

    // Favorites

    /// Most recently added first
    pub fn favorites(&self) -> Vec<FavoriteItem> {
        self.lock().favorites.clone()
    }

    pub fn add_favorite(&self, content: ContentSnapshot) {
        let mut mirror = self.lock();
        let id = content.id;
        mirror.favorites.retain(|f| f.content_id != id);
        mirror.favorites.insert(0, FavoriteItem::new(content));
        self.flush(StorageKey::FavoriteSeries, &mirror.favorites);
    }

    /// Returns whether anything was removed
    pub fn remove_favorite(&self, content_id: u64) -> bool {
        let mut mirror = self.lock();
        let before = mirror.favorites.len();
        mirror.favorites.retain(|f| f.content_id != content_id);
        let removed = mirror.favorites.len() != before;
        if removed {
            self.flush(StorageKey::FavoriteSeries, &mirror.favorites);
        }
        removed
    }

    pub fn is_favorite(&self, content_id: u64) -> bool {
        self.lock().favorites.iter().any(|f| f.content_id == content_id)
    }

    // Watched history

    /// Most recently watched first
    pub fn watched(&self) -> Vec<WatchedItem> {
        self.lock().watched.clone()
    }

    /// Record content as watched, replacing any earlier entry for it.
    ///
    /// A rating outside 0..=10 is dropped with a warning.
    pub fn add_watched(&self, content: ContentSnapshot, rating: Option<f32>, review: Option<String>) {
        let rating = match rating {
            Some(score) if !is_valid_score(score) => {
                warn!("Ignoring out-of-range rating {} for {}", score, content.id);
                None
            }
            other => other,
        };

        let mut mirror = self.lock();
        let id = content.id;
        mirror.watched.retain(|w| w.content_id != id);
        mirror.watched.insert(0, WatchedItem::new(content, rating, review));
        self.flush(StorageKey::WatchedSeries, &mirror.watched);
    }

    pub fn remove_watched(&self, content_id: u64) -> bool {
        let mut mirror = self.lock();
        let before = mirror.watched.len();
        mirror.watched.retain(|w| w.content_id != content_id);
        let removed = mirror.watched.len() != before;
        if removed {
            self.flush(StorageKey::WatchedSeries, &mirror.watched);
        }
        removed
    }

    pub fn is_watched(&self, content_id: u64) -> bool {
        self.lock().watched.iter().any(|w| w.content_id == content_id)
    }

    pub fn watched_ids(&self) -> HashSet<u64> {
        self.lock().watched.iter().map(|w| w.content_id).collect()
    }

    // Onboarding

    pub fn is_onboarding_completed(&self) -> bool {
        self.lock().onboarding_completed
    }

    pub fn complete_onboarding(&self) {
        let mut mirror = self.lock();
        mirror.onboarding_completed = true;
        self.flush(StorageKey::OnboardingCompleted, &true);
    }

    // Export / import

    pub fn export(&self) -> ExportBundle {
        let mirror = self.lock();
        ExportBundle {
            preferences: mirror.preferences.clone(),
            watched_series: mirror.watched.clone(),
            favorite_series: mirror.favorites.clone(),
            export_date: Utc::now(),
        }
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export())
    }

    /// Replace preferences, favorites and watched history with the bundle's.
    ///
    /// The onboarding flag is left alone.
    pub fn import(&self, bundle: ExportBundle) {
        let mut mirror = self.lock();
        mirror.preferences = bundle.preferences;
        mirror.watched = dedupe_by(bundle.watched_series, |w| w.content_id);
        mirror.favorites = dedupe_by(bundle.favorite_series, |f| f.content_id);

        self.flush(StorageKey::Preferences, &mirror.preferences);
        self.flush(StorageKey::WatchedSeries, &mirror.watched);
        self.flush(StorageKey::FavoriteSeries, &mirror.favorites);
        info!(
            "Imported {} watched, {} favorites",
            mirror.watched.len(),
            mirror.favorites.len()
        );
    }

    /// Parse and import an export document. Nothing is changed on error.
    ///
    /// Preferences are merged over the defaults like a stored value, so an
    /// export from a version with fewer fields still imports.
    pub fn import_json(&self, json: &str) -> Result<(), ImportError> {
        let bundle = parse_bundle(json)?;
        self.import(bundle);
        Ok(())
    }

    /// Remove every key from storage and reset it to its default.
    ///
    /// Unlike other writes a failure is returned: a key that could not be
    /// removed keeps its data in the mirror, since it would reappear on the
    /// next open anyway. The first error is returned after every key was tried.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let mut mirror = self.lock();
        let mut first_error = None;
        for key in StorageKey::ALL {
            match self.port.remove(key, self.id) {
                Ok(()) => mirror.reset(key),
                Err(e) => {
                    warn!("Failed to remove {}: {}", key, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                info!("Cleared all local data");
                Ok(())
            }
        }
    }

    // Changes from other store instances

    /// Reload the key named by `event` if another store wrote it.
    ///
    /// Returns whether the mirror was reloaded.
    pub fn handle_storage_event(&self, event: &StorageEvent) -> bool {
        if event.origin == self.id {
            return false;
        }
        debug!("Reloading {} after external change by {}", event.key, event.origin);
        self.reload(event.key);
        true
    }

    fn reload(&self, key: StorageKey) {
        let port = self.port.as_ref();
        match key {
            StorageKey::Preferences => {
                let preferences = load_preferences(port);
                self.lock().preferences = preferences;
            }
            StorageKey::WatchedSeries => {
                let watched = load_list(port, key);
                self.lock().watched = watched;
            }
            StorageKey::FavoriteSeries => {
                let favorites = load_list(port, key);
                self.lock().favorites = favorites;
            }
            StorageKey::OnboardingCompleted => {
                let completed = load_flag(port, key);
                self.lock().onboarding_completed = completed;
            }
        }
    }

    /// Keep this store in sync with writes made through other instances on
    /// the same port until `cancel` fires. The last write wins.
    pub fn watch_external_changes(store: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let mut events = store.port.subscribe();
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(event) => {
                        store.handle_storage_event(&event);
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Missed {} storage events, reloading everything", missed);
                        for key in StorageKey::ALL {
                            store.reload(key);
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Stopped watching storage changes for store {}", store.id);
        })
    }
}

fn parse_bundle(json: &str) -> Result<ExportBundle, ImportError> {
    let value: Value = serde_json::from_str(json)?;
    let obj = value.as_object().ok_or(ImportError::MissingField("preferences"))?;

    let preferences = obj.get("preferences").ok_or(ImportError::MissingField("preferences"))?;
    let (preferences, rejected) = Preferences::merge_stored(preferences);
    if !rejected.is_empty() {
        warn!("Ignoring invalid imported preference fields: {}", rejected.join(", "));
    }

    let watched_series = field(obj, "watchedSeries")?;
    let favorite_series = field(obj, "favoriteSeries")?;
    let export_date = match obj.get("exportDate") {
        Some(date) => serde_json::from_value(date.clone())
            .map_err(|source| ImportError::InvalidField { field: "exportDate", source })?,
        None => Utc::now(),
    };

    Ok(ExportBundle {
        preferences,
        watched_series,
        favorite_series,
        export_date,
    })
}

fn field<T: DeserializeOwned>(
    obj: &serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<Vec<T>, ImportError> {
    let value = obj.get(name).ok_or(ImportError::MissingField(name))?;
    serde_json::from_value(value.clone()).map_err(|source| ImportError::InvalidField { field: name, source })
}

fn dedupe_by<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> u64,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

fn read_key(port: &dyn StoragePort, key: StorageKey) -> Option<String> {
    match port.read(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read {}: {}. Using defaults.", key, e);
            None
        }
    }
}

fn load_preferences(port: &dyn StoragePort) -> Preferences {
    let Some(raw) = read_key(port, StorageKey::Preferences) else {
        return Preferences::default();
    };
    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Stored preferences are corrupt: {}. Using defaults.", e);
            return Preferences::default();
        }
    };
    let (preferences, rejected) = Preferences::merge_stored(&value);
    if !rejected.is_empty() {
        warn!("Dropped invalid stored preference fields: {}", rejected.join(", "));
    }
    preferences
}

/// Load a stored array, skipping entries that no longer decode
fn load_list<T: DeserializeOwned>(port: &dyn StoragePort, key: StorageKey) -> Vec<T> {
    let Some(raw) = read_key(port, key) else {
        return Vec::new();
    };
    let entries: Vec<Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Stored {} is corrupt: {}. Starting empty.", key, e);
            return Vec::new();
        }
    };

    let total = entries.len();
    let items: Vec<T> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();
    if items.len() != total {
        warn!("Skipped {} unreadable entries in {}", total - items.len(), key);
    }
    items
}

fn load_flag(port: &dyn StoragePort, key: StorageKey) -> bool {
    read_key(port, key)
        .and_then(|raw| serde_json::from_str::<bool>(raw.trim()).ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use watchwhat_models::ContentKind;

    fn snapshot(id: u64, title: &str) -> ContentSnapshot {
        ContentSnapshot {
            id,
            kind: ContentKind::Series,
            title: title.to_string(),
            poster_path: None,
            release_date: Some("2020-01-01".to_string()),
            vote_average: 7.5,
            genre_ids: vec![18],
        }
    }

    fn memory_store() -> (Arc<MemoryStorage>, LocalPreferenceStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = LocalPreferenceStore::open(storage.clone());
        (storage, store)
    }

    #[test]
    fn test_defaults_on_first_read() {
        let (_, store) = memory_store();
        assert_eq!(store.get(), Preferences::default());
        assert!(store.favorites().is_empty());
        assert!(!store.is_onboarding_completed());
    }

    #[test]
    fn test_partial_stored_preferences_are_merged() {
        let storage = Arc::new(MemoryStorage::new());
        storage.seed(StorageKey::Preferences, r#"{"minRating":7.5,"favoriteGenres":[18],"bogus":1}"#);
        let store = LocalPreferenceStore::open(storage);

        let prefs = store.get();
        assert_eq!(prefs.min_rating, 7.5);
        assert_eq!(prefs.favorite_genres, vec![18]);
        assert_eq!(prefs.max_rating, 10.0);
        assert_eq!(prefs.preferred_languages, vec!["en".to_string()]);
    }

    #[test]
    fn test_corrupt_storage_falls_back_to_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        storage.seed(StorageKey::Preferences, "{not json");
        storage.seed(StorageKey::WatchedSeries, "42");
        let store = LocalPreferenceStore::open(storage);

        assert_eq!(store.get(), Preferences::default());
        assert!(store.watched().is_empty());
    }

    #[test]
    fn test_add_favorite_is_idempotent_and_newest_first() {
        let (_, store) = memory_store();
        store.add_favorite(snapshot(1, "One"));
        store.add_favorite(snapshot(2, "Two"));
        store.add_favorite(snapshot(1, "One again"));

        let favorites = store.favorites();
        assert_eq!(favorites.len(), 2);
        assert_eq!(favorites[0].content_id, 1);
        assert_eq!(favorites[0].content.title, "One again");
        assert_eq!(favorites[1].content_id, 2);
        assert!(store.is_favorite(2));

        assert!(store.remove_favorite(2));
        assert!(!store.remove_favorite(2));
        assert!(!store.is_favorite(2));
    }

    #[test]
    fn test_watched_replaces_earlier_entry() {
        let (_, store) = memory_store();
        store.add_watched(snapshot(5, "Five"), Some(6.0), None);
        store.add_watched(snapshot(5, "Five"), Some(9.0), Some("Better second time".to_string()));

        let watched = store.watched();
        assert_eq!(watched.len(), 1);
        assert_eq!(watched[0].rating, Some(9.0));
        assert!(store.is_watched(5));
        assert_eq!(store.watched_ids(), HashSet::from([5]));
    }

    #[test]
    fn test_out_of_range_watched_rating_is_dropped() {
        let (_, store) = memory_store();
        store.add_watched(snapshot(5, "Five"), Some(11.0), None);
        assert_eq!(store.watched()[0].rating, None);
    }

    #[test]
    fn test_changes_survive_reopen() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let store = LocalPreferenceStore::open(storage.clone());
            store.update(|p| p.toggle_favorite_genre(35));
            store.add_favorite(snapshot(3, "Three"));
            store.complete_onboarding();
        }

        let reopened = LocalPreferenceStore::open(storage);
        assert_eq!(reopened.get().favorite_genres, vec![35]);
        assert_eq!(reopened.favorites().len(), 1);
        assert!(reopened.is_onboarding_completed());
    }

    #[test]
    fn test_flush_failure_keeps_mirror() {
        let (storage, store) = memory_store();
        storage.set_failing_writes(true);
        store.add_favorite(snapshot(9, "Nine"));
        assert!(store.is_favorite(9));
        assert_eq!(storage.read(StorageKey::FavoriteSeries).unwrap(), None);
    }

    #[test]
    fn test_export_import_round_trip() {
        let (_, source) = memory_store();
        source.update(|p| {
            p.min_rating = 7.0;
            p.disliked_genres = vec![27];
        });
        source.add_favorite(snapshot(1, "One"));
        source.add_watched(snapshot(2, "Two"), Some(8.5), Some("Great".to_string()));
        source.add_watched(snapshot(3, "Three"), None, None);

        let json = source.export_json().unwrap();

        let (_, target) = memory_store();
        target.import_json(&json).unwrap();

        assert_eq!(target.get(), source.get());
        assert_eq!(target.favorites(), source.favorites());
        assert_eq!(target.watched(), source.watched());
    }

    #[test]
    fn test_malformed_import_changes_nothing() {
        let (_, store) = memory_store();
        store.add_favorite(snapshot(1, "One"));

        assert!(matches!(store.import_json("{oops"), Err(ImportError::Malformed(_))));
        assert!(matches!(
            store.import_json(r#"{"preferences":{},"watchedSeries":[]}"#),
            Err(ImportError::MissingField("favoriteSeries"))
        ));
        assert!(matches!(
            store.import_json(r#"{"preferences":{},"watchedSeries":[{"id":1}],"favoriteSeries":[]}"#),
            Err(ImportError::InvalidField { field: "watchedSeries", .. })
        ));

        assert_eq!(store.favorites().len(), 1);
    }

    #[test]
    fn test_clear_all() {
        let (storage, store) = memory_store();
        store.add_favorite(snapshot(1, "One"));
        store.complete_onboarding();
        store.clear_all().unwrap();

        assert!(store.favorites().is_empty());
        assert!(!store.is_onboarding_completed());
        for key in StorageKey::ALL {
            assert_eq!(storage.read(key).unwrap(), None);
        }
    }

    #[test]
    fn test_clear_all_reports_failed_removal() {
        let (storage, store) = memory_store();
        store.add_favorite(snapshot(1, "One"));
        storage.set_failing_writes(true);

        assert!(store.clear_all().is_err());
        assert!(store.is_favorite(1));

        storage.set_failing_writes(false);
        let reopened = LocalPreferenceStore::open(storage.clone());
        assert!(reopened.is_favorite(1));
    }

    #[test]
    fn test_external_write_is_picked_up() {
        let storage = Arc::new(MemoryStorage::new());
        let tab_a = LocalPreferenceStore::open(storage.clone());
        let tab_b = LocalPreferenceStore::open(storage.clone());
        let mut events = storage.subscribe();

        tab_a.add_favorite(snapshot(4, "Four"));
        let event = events.try_recv().unwrap();

        assert!(!tab_a.handle_storage_event(&event));
        assert!(!tab_b.is_favorite(4));
        assert!(tab_b.handle_storage_event(&event));
        assert!(tab_b.is_favorite(4));
    }

    #[tokio::test]
    async fn test_watcher_applies_last_write() {
        let storage = Arc::new(MemoryStorage::new());
        let tab_a = LocalPreferenceStore::open(storage.clone());
        let tab_b = Arc::new(LocalPreferenceStore::open(storage.clone()));
        let cancel = CancellationToken::new();
        let handle = LocalPreferenceStore::watch_external_changes(tab_b.clone(), cancel.clone());

        tab_a.update(|p| p.min_rating = 5.0);
        tab_a.update(|p| p.min_rating = 8.0);

        for _ in 0..50 {
            if tab_b.get().min_rating == 8.0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(tab_b.get().min_rating, 8.0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
