//! Application configuration management.
//!
//! Handles loading, saving, and managing application-wide settings,
//! including the directory backing durable storage and the remote song
//! source for the catalog.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, FileSystemError, Result};

/// Default number of entries kept in the recently-played history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Default playback volume (percent).
pub const DEFAULT_VOLUME: u8 = 70;

/// Default timeout for fetching the remote song list.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Where the catalog's fetched song list comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Path to a JSON file or an http(s) URL. `None` means static songs only.
    #[serde(default)]
    pub source: Option<String>,
    /// Timeout for remote fetches, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

const fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding the durable key-value files.
    pub storage_directory: PathBuf,
    /// Catalog source settings.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Maximum number of recently-played entries.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Initial playback volume, 0-100.
    #[serde(default = "default_volume")]
    pub default_volume: u8,
}

const fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

const fn default_volume() -> u8 {
    DEFAULT_VOLUME
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_directory: default_storage_directory(),
            catalog: CatalogConfig::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_volume: DEFAULT_VOLUME,
        }
    }
}

impl AppConfig {
    /// Read the config from its standard location.
    ///
    /// A missing file yields the defaults, which are written back.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Read the config from `config_path`, writing defaults there if absent.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, writing defaults", config_path.display());
                let config = Self::default();
                if let Err(e) = config.save_to(config_path) {
                    warn!("Could not write default config: {}", e);
                }
                return Ok(config);
            }
            Err(e) => {
                return Err(FileSystemError::ReadFailed {
                    path: config_path.to_path_buf(),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        let mut config: Self = serde_json::from_str(&content).map_err(|e| {
            Error::Configuration(format!("Invalid config {}: {e}", config_path.display()))
        })?;
        config.normalize();

        info!(
            "Config loaded: storage in {}, catalog source {:?}",
            config.storage_directory.display(),
            config.catalog.source
        );
        Ok(config)
    }

    /// Write the config to its standard location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file_path())
    }

    /// Write the config as pretty JSON to `config_path`.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| FileSystemError::CreateDirFailed {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        fs::write(config_path, serde_json::to_string_pretty(self)?).map_err(|e| {
            FileSystemError::WriteFailed {
                path: config_path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        debug!("Config written to {}", config_path.display());
        Ok(())
    }

    /// Point durable storage at `path`, creating it if needed.
    pub fn set_storage_directory(&mut self, path: PathBuf) -> Result<()> {
        validate_storage_directory(&path)?;
        info!("Storage directory is now {}", path.display());
        self.storage_directory = path;
        Ok(())
    }

    /// Repair out-of-range values read from disk.
    fn normalize(&mut self) {
        if self.history_capacity == 0 {
            warn!("history_capacity 0 replaced with {}", DEFAULT_HISTORY_CAPACITY);
            self.history_capacity = DEFAULT_HISTORY_CAPACITY;
        }
        self.default_volume = self.default_volume.min(100);
    }

    /// Standard config file location.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        config_file_path()
    }
}

/// Default directory for durable storage.
#[must_use]
pub fn default_storage_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("groovify")
        .join("storage")
}

fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("groovify")
        .join("config.json")
}

/// Storage must be an absolute, writable directory. Missing directories are created.
fn validate_storage_directory(path: &Path) -> Result<()> {
    if !path.is_absolute() {
        return Err(Error::Configuration(format!(
            "Storage directory {} is not an absolute path",
            path.display()
        )));
    }

    if !path.exists() {
        return fs::create_dir_all(path).map_err(|e| {
            FileSystemError::CreateDirFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        });
    }

    if !path.is_dir() {
        return Err(Error::Configuration(format!(
            "Storage path {} is not a directory",
            path.display()
        )));
    }

    let probe = path.join(".groovify_write_test");
    fs::write(&probe, b"")
        .map_err(|e| Error::Configuration(format!("Cannot write to {}: {e}", path.display())))?;
    if let Err(e) = fs::remove_file(&probe) {
        debug!("Leftover write probe {}: {}", probe.display(), e);
    }
    Ok(())
}

/// Holds the loaded config and the file it is saved to.
pub struct ConfigManager {
    config: AppConfig,
    path: PathBuf,
}

impl ConfigManager {
    /// Load from the standard location.
    pub fn new() -> Result<Self> {
        Self::with_path(config_file_path())
    }

    /// Load from `path`; later saves go there too.
    pub fn with_path(path: PathBuf) -> Result<Self> {
        let config = AppConfig::load_from(&path)?;
        Ok(Self { config, path })
    }

    /// Current config.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current storage directory.
    #[must_use]
    pub fn storage_directory(&self) -> &Path {
        &self.config.storage_directory
    }

    /// Replace the whole config and save it.
    pub fn update(&mut self, mut config: AppConfig) -> Result<()> {
        validate_storage_directory(&config.storage_directory)?;
        config.normalize();

        self.config = config;
        self.config.save_to(&self.path)
    }

    /// Change the storage directory and save.
    pub fn set_storage_directory(&mut self, path: PathBuf) -> Result<()> {
        self.config.set_storage_directory(path)?;
        self.config.save_to(&self.path)
    }

    /// Restore and save the defaults.
    pub fn reset(&mut self) -> Result<()> {
        self.config = AppConfig::default();
        self.config.save_to(&self.path)
    }
}
