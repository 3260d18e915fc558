use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Set once the intro dialog has been shown.
pub const INTRO_SEEN_KEY: &str = "hasSeenIntro";
/// JSON `PuzzleSnapshot` of the last sliding-puzzle game.
pub const PUZZLE_STATE_KEY: &str = "gridPuzzleState";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage rejected write of {key}: {reason}")]
    WriteRejected { key: String, reason: String },
    #[error("could not serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Minimal string key-value store, shaped like the browser's `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&mut self, key: &str);
}

/// In-process store for native builds and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// `window.localStorage`.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn open() -> Result<Self, PersistError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(PersistError::Unavailable)?;
        Ok(LocalStorage { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.storage.set_item(key, value).map_err(|e| PersistError::WriteRejected {
            key: key.to_string(),
            reason: format!("{:?}", e),
        })
    }

    fn remove(&mut self, key: &str) {
        let _ = self.storage.remove_item(key);
    }
}

/// True the first time it is called for a store, false afterwards.
pub fn take_intro_flag(store: &mut dyn KeyValueStore) -> bool {
    if store.get(INTRO_SEEN_KEY).as_deref() == Some("true") {
        return false;
    }
    if let Err(e) = store.set(INTRO_SEEN_KEY, "true") {
        log::error!("persist: {}", e);
    }
    true
}

pub fn save_json<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> Result<(), PersistError> {
    let json = serde_json::to_string(value).map_err(|source| PersistError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &json)
}

/// Missing keys and undecodable blobs both load as `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("persist: discarding unreadable {}: {}", key, e);
            None
        }
    }
}
