//! Durable key-value storage boundary.
//!
//! The library persists exactly two logical keys, each holding one JSON
//! document. [`KeyValueStore`] abstracts the medium so the persistence
//! layer can be tested against [`MemoryStore`] and run against
//! [`FileStore`] in production.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Error, FileSystemError, Result, StorageError};

/// Key holding the serialized playlist collection.
pub const PLAYLISTS_KEY: &str = "groovify-playlists";

/// Key holding the serialized recently-played history.
pub const RECENTLY_PLAYED_KEY: &str = "groovify-recently-played";

/// Abstraction over durable string-valued storage.
pub trait KeyValueStore: Send {
    /// Read the value for `key`, or `None` if it was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value for `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store.
///
/// Clones share the same map, so a test can keep a handle and inspect what
/// a session wrote, or hand it to a second session to simulate a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one `<key>.json` file per key inside a directory.
///
/// Writes land in a sibling temp file first and are renamed into place, so
/// a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `directory`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        if !directory.exists() {
            fs::create_dir_all(&directory).map_err(|e| {
                Error::FileSystem(FileSystemError::CreateDirFailed {
                    path: directory.clone(),
                    reason: e.to_string(),
                })
            })?;
        }
        Ok(Self { directory })
    }

    /// Directory backing this store.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::Storage(StorageError::InvalidKey {
                key: key.to_string(),
                reason: "keys may only contain ASCII letters, digits, '-' and '_'".to_string(),
            }));
        }
        Ok(self.directory.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No stored value for '{}'", key);
                Ok(None)
            }
            Err(e) => Err(Error::FileSystem(FileSystemError::ReadFailed {
                path,
                reason: e.to_string(),
            })),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("json.tmp");

        let write_tmp = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()
        };
        write_tmp().map_err(|e| {
            Error::FileSystem(FileSystemError::WriteFailed {
                path: tmp_path.clone(),
                reason: e.to_string(),
            })
        })?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            Error::FileSystem(FileSystemError::WriteFailed {
                path: path.clone(),
                reason: e.to_string(),
            })
        })?;

        debug!("Stored '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::FileSystem(FileSystemError::DeleteFailed {
                path,
                reason: e.to_string(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_clones_share_entries() {
        let mut store = MemoryStore::new();
        let observer = store.clone();

        store.set(PLAYLISTS_KEY, "[]").expect("set");
        assert_eq!(observer.get(PLAYLISTS_KEY).expect("get"), Some("[]".to_string()));
        assert_eq!(observer.len(), 1);

        store.remove(PLAYLISTS_KEY).expect("remove");
        assert!(observer.is_empty());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let mut store = FileStore::new(temp_dir.path().join("storage")).expect("open");

        assert_eq!(store.get(RECENTLY_PLAYED_KEY).expect("get"), None);

        store.set(RECENTLY_PLAYED_KEY, r#"[{"id":"1"}]"#).expect("set");
        assert_eq!(
            store.get(RECENTLY_PLAYED_KEY).expect("get"),
            Some(r#"[{"id":"1"}]"#.to_string())
        );
        assert!(
            store
                .directory()
                .join("groovify-recently-played.json")
                .exists()
        );
        assert!(
            !store
                .directory()
                .join("groovify-recently-played.json.tmp")
                .exists()
        );
    }

    #[test]
    fn test_file_store_overwrites_value() {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let mut store = FileStore::new(temp_dir.path()).expect("open");

        store.set(PLAYLISTS_KEY, "first").expect("set");
        store.set(PLAYLISTS_KEY, "second").expect("set");
        assert_eq!(store.get(PLAYLISTS_KEY).expect("get"), Some("second".to_string()));
    }

    #[test]
    fn test_file_store_replaces_longer_value_and_leftover_tmp() {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let mut store = FileStore::new(temp_dir.path()).expect("open");
        let tmp = temp_dir.path().join("groovify-playlists.json.tmp");
        std::fs::write(&tmp, "stale partial write").expect("write tmp");

        store.set(PLAYLISTS_KEY, "a much longer first value").expect("set");
        store.set(PLAYLISTS_KEY, "[]").expect("set");

        assert_eq!(store.get(PLAYLISTS_KEY).expect("get"), Some("[]".to_string()));
        assert!(!tmp.exists());
    }

    #[test]
    fn test_file_store_remove_missing_is_ok() {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let mut store = FileStore::new(temp_dir.path()).expect("open");
        assert!(store.remove(PLAYLISTS_KEY).is_ok());
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let store = FileStore::new(temp_dir.path()).expect("open");

        let result = store.get("../escape");
        assert!(matches!(
            result,
            Err(Error::Storage(StorageError::InvalidKey { .. }))
        ));
    }
}
