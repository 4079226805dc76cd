//! Error types for Groovify core operations.
//!
//! None of these errors reach the callers of the library or playback
//! operations: absence is a silent no-op and I/O failures degrade to empty
//! values. They exist so the I/O edges (storage, catalog fetch, audio
//! transport, config) can report precisely what went wrong before the
//! caller logs and swallows it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// File system failures, tagged with the path involved.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// Reading a file failed.
    #[error("Failed to read {path}: {reason}")]
    ReadFailed {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Writing a file failed.
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Creating a directory failed.
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirFailed {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Deleting a file failed.
    #[error("Failed to delete {path}: {reason}")]
    DeleteFailed {
        /// Path that could not be deleted.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },
}

/// Durable key-value storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key cannot be mapped onto the backing store.
    #[error("Invalid storage key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A shared in-memory store was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Catalog fetch failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The song list could not be retrieved.
    #[error("Failed to fetch catalog from {location}: {reason}")]
    FetchFailed {
        /// File path or URL of the source.
        location: String,
        /// Underlying reason.
        reason: String,
    },

    /// The song list was retrieved but is not a list of songs.
    #[error("Invalid catalog data from {location}: {reason}")]
    InvalidData {
        /// File path or URL of the source.
        location: String,
        /// Parse failure.
        reason: String,
    },
}

/// Audio transport command failures.
#[derive(Debug, Error)]
#[error("Transport command '{command}' failed: {reason}")]
pub struct TransportError {
    /// Command that failed (load, play, pause, seek, set_volume).
    pub command: &'static str,
    /// Underlying reason reported by the audio element.
    pub reason: String,
}

/// Errors that can occur in Groovify core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed.
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    /// Durable storage operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Catalog fetch failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Audio transport rejected a command.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_system_error_display() {
        let err = Error::from(FileSystemError::WriteFailed {
            path: PathBuf::from("/test/path"),
            reason: "permission denied".to_string(),
        });
        assert!(err.to_string().contains("/test/path"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_catalog_error_display() {
        let err = Error::from(CatalogError::FetchFailed {
            location: "/music/songs.json".to_string(),
            reason: "not found".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Failed to fetch catalog from /music/songs.json: not found"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let err = Error::from(TransportError {
            command: "play",
            reason: "autoplay blocked".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Transport command 'play' failed: autoplay blocked"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse_err = serde_json::from_str::<Vec<String>>("not json").expect_err("should fail");
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
