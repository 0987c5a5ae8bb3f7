//! Key-value persistence behind a single port.
//!
//! Every successful write or remove is announced on a broadcast channel so
//! that other store instances sharing the same port can reload.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;
use watchwhat_config::PathManager;

const EVENT_CAPACITY: usize = 64;

/// Identifies the store instance that made a change
pub type WriterId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Preferences,
    WatchedSeries,
    FavoriteSeries,
    OnboardingCompleted,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::Preferences,
        StorageKey::WatchedSeries,
        StorageKey::FavoriteSeries,
        StorageKey::OnboardingCompleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Preferences => "watchwhat_preferences",
            StorageKey::WatchedSeries => "watchwhat_watched_series",
            StorageKey::FavoriteSeries => "watchwhat_favorite_series",
            StorageKey::OnboardingCompleted => "watchwhat_onboarding_completed",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: StorageKey,
    pub origin: WriterId,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub trait StoragePort: Send + Sync {
    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError>;

    fn write(&self, key: StorageKey, value: &str, origin: WriterId) -> Result<(), StorageError>;

    fn remove(&self, key: StorageKey, origin: WriterId) -> Result<(), StorageError>;

    /// Change notifications for every key, including the subscriber's own writes
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// One JSON file per key in a directory
pub struct FileStorage {
    dir: PathBuf,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self { dir, events })
    }

    pub fn open(path_manager: &PathManager) -> Result<Self, StorageError> {
        Self::new(path_manager.storage_dir())
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    fn notify(&self, key: StorageKey, origin: WriterId) {
        // No receivers is not an error
        let _ = self.events.send(StorageEvent { key, origin });
    }
}

impl StoragePort for FileStorage {
    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Storage miss: {}", key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: StorageKey, value: &str, origin: WriterId) -> Result<(), StorageError> {
        let path = self.path_for(key);
        // Unique per writer, so concurrent processes never share a temp file
        let temp_path = self.dir.join(format!(
            "{}.json.{}-{}.tmp",
            key.as_str(),
            std::process::id(),
            TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = std::fs::write(&temp_path, value).and_then(|()| std::fs::rename(&temp_path, &path)) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        debug!("Storage write: {} ({} bytes)", key, value.len());
        self.notify(key, origin);
        Ok(())
    }

    fn remove(&self, key: StorageKey, origin: WriterId) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.notify(key, origin);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

/// In-process storage for tests and throwaway sessions
pub struct MemoryStorage {
    entries: Mutex<HashMap<StorageKey, String>>,
    events: broadcast::Sender<StorageEvent>,
    failing_writes: AtomicBool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            events,
            failing_writes: AtomicBool::new(false),
        }
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes and removes fail, as a full or read-only disk would
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Put a raw value without emitting an event
    pub fn seed(&self, key: StorageKey, value: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.into());
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned())
    }

    fn write(&self, key: StorageKey, value: &str, origin: WriterId) -> Result<(), StorageError> {
        self.check_writable()?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_string());
        let _ = self.events.send(StorageEvent { key, origin });
        Ok(())
    }

    fn remove(&self, key: StorageKey, origin: WriterId) -> Result<(), StorageError> {
        self.check_writable()?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        let _ = self.events.send(StorageEvent { key, origin });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
