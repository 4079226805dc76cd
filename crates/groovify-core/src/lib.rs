//! Groovify Core Library
//!
//! This crate owns the client-side state of the Groovify music player:
//! - Song catalog (built-in songs merged with a fetched list), genres and search
//! - Playlists and recently-played history, persisted to a key-value store
//! - The live playback session (current song, queue, repeat mode, progress)
//! - A [`Session`] wiring them to an external audio transport

pub mod catalog;
pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod persistence;
pub mod playback;
pub mod playlist;
pub mod search;
pub mod session;
pub mod song;
pub mod storage;
pub mod transport;

pub use catalog::{Catalog, FileSource, HttpSource, SongSource, SortOrder};
pub use config::{AppConfig, ConfigManager};
pub use error::{Error, Result};
pub use library::LibraryStore;
pub use logging::{LoggingConfig, init_logging};
pub use persistence::PersistenceGateway;
pub use playback::{PlaybackEvent, PlaybackSession, PlaybackStatus, RepeatMode, format_time};
pub use playlist::Playlist;
pub use search::SearchIndex;
pub use session::{Session, SessionSnapshot};
pub use song::Song;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use transport::{AudioTransport, NullTransport, TransportEvent};
