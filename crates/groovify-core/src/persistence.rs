//! Persistence gateway for playlists and recently-played history.
//!
//! Loads never fail: missing or corrupt data is equivalent to a new user and
//! yields an empty collection. Saves serialize the whole collection every
//! time and report failures to the caller, which logs them.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::Result;
use crate::playlist::Playlist;
use crate::song::Song;
use crate::storage::{KeyValueStore, PLAYLISTS_KEY, RECENTLY_PLAYED_KEY};

/// Reads and writes the library's two persisted collections.
pub struct PersistenceGateway {
    store: Box<dyn KeyValueStore>,
}

impl PersistenceGateway {
    /// Wrap a key-value store.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Load the saved playlists, or an empty list if none/corrupt.
    pub fn load_playlists(&self) -> Vec<Playlist> {
        self.load_collection(PLAYLISTS_KEY)
    }

    /// Persist the full playlist collection.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    pub fn save_playlists(&mut self, playlists: &[Playlist]) -> Result<()> {
        self.save_collection(PLAYLISTS_KEY, playlists)
    }

    /// Load the recently-played history, or an empty list if none/corrupt.
    pub fn load_recently_played(&self) -> Vec<Song> {
        self.load_collection(RECENTLY_PLAYED_KEY)
    }

    /// Persist the full recently-played history.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    pub fn save_recently_played(&mut self, songs: &[Song]) -> Result<()> {
        self.save_collection(RECENTLY_PLAYED_KEY, songs)
    }

    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let content = match self.store.get(key) {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!("Nothing stored under '{}', starting empty", key);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read '{}', starting empty: {}", key, e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(items) => items,
            Err(e) => {
                warn!("Discarding corrupt data under '{}': {}", key, e);
                Vec::new()
            }
        }
    }

    fn save_collection<T: Serialize>(&mut self, key: &str, items: &[T]) -> Result<()> {
        let content = serde_json::to_string(items)?;
        self.store.set(key, &content)?;
        debug!("Saved {} entries under '{}'", items.len(), key);
        Ok(())
    }
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway").finish_non_exhaustive()
    }
}
