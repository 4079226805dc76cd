//! Integration tests for Groovify session workflows.
//!
//! These tests drive a full [`Session`] over file-backed storage in a
//! temporary directory and check what survives a restart:
//! - Playlist creation and editing
//! - Recently-played history
//! - Catalog loading from a song-list file
//! - Recovery from corrupt or missing storage

use std::fs;
use std::path::{Path, PathBuf};

use groovify_core::catalog::source_from_config;
use groovify_core::config::CatalogConfig;
use groovify_core::{
    AppConfig, Error, FileSource, NullTransport, PlaybackStatus, RepeatMode, Result, Session, Song,
    SongSource, TransportEvent,
};
use tempfile::TempDir;

// =============================================================================
// Test Fixtures and Utilities
// =============================================================================

/// Temporary storage directory plus the config pointing at it.
struct TestFixture {
    dir: TempDir,
    config: AppConfig,
}

impl TestFixture {
    fn new() -> Result<Self> {
        let dir = TempDir::new()
            .map_err(|e| Error::Configuration(format!("Failed to create temp dir: {e}")))?;
        let config = AppConfig {
            storage_directory: dir.path().join("storage"),
            ..AppConfig::default()
        };
        Ok(Self { dir, config })
    }

    fn storage_path(&self) -> &Path {
        &self.config.storage_directory
    }

    /// Open and start a session, as an application launch would.
    fn launch(&self, source: Option<&dyn SongSource>) -> Result<Session<NullTransport>> {
        let mut session = Session::open(&self.config, NullTransport)?;
        session.start(source);
        Ok(session)
    }

    /// Write a song-list file and return its path.
    fn write_song_list(&self, songs: &[Song]) -> PathBuf {
        let path = self.dir.path().join("songs.json");
        let json = serde_json::to_string(songs).expect("Should serialize songs");
        fs::write(&path, json).expect("Should write song list");
        path
    }

    fn write_key(&self, key: &str, content: &str) {
        fs::create_dir_all(self.storage_path()).expect("Should create storage dir");
        fs::write(self.storage_path().join(format!("{key}.json")), content)
            .expect("Should write storage file");
    }
}

fn builtin(session: &Session<NullTransport>, id: &str) -> Song {
    session
        .catalog()
        .get(id)
        .cloned()
        .expect("Built-in song should exist")
}

// =============================================================================
// Persistence Across Restarts
// =============================================================================

#[test]
fn test_playlist_survives_restart() {
    let fixture = TestFixture::new().expect("Should create fixture");

    let playlist_id = {
        let mut session = fixture.launch(None).expect("Should launch");
        let playlist = session.create_playlist("Road Trip", Some("Songs for the drive"));
        let first = builtin(&session, "1");
        let second = builtin(&session, "2");
        session.add_song_to_playlist(&playlist.id, first.clone());
        session.add_song_to_playlist(&playlist.id, second);
        session.add_song_to_playlist(&playlist.id, first);
        playlist.id
    };

    let session = fixture.launch(None).expect("Should relaunch");
    let playlist = session
        .library()
        .playlist(&playlist_id)
        .expect("Playlist should be reloaded");
    assert_eq!(playlist.name, "Road Trip");
    assert_eq!(playlist.description.as_deref(), Some("Songs for the drive"));
    let ids: Vec<_> = playlist.songs.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);
}

#[test]
fn test_history_survives_restart() {
    let fixture = TestFixture::new().expect("Should create fixture");

    {
        let mut session = fixture.launch(None).expect("Should launch");
        let catalog = session.catalog().songs().to_vec();
        session.play(catalog[0].clone(), catalog.clone());
        session.next();
        session.next();
        session.previous();
    }

    let session = fixture.launch(None).expect("Should relaunch");
    let history: Vec<_> = session
        .library()
        .recently_played()
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(history, vec!["2", "3", "1"]);
    assert_eq!(session.playback().status(), PlaybackStatus::Idle);
}

#[test]
fn test_deleted_playlist_stays_deleted() {
    let fixture = TestFixture::new().expect("Should create fixture");

    {
        let mut session = fixture.launch(None).expect("Should launch");
        let keep = session.create_playlist("Keep", None);
        let drop = session.create_playlist("Drop", None);
        session.delete_playlist(&drop.id);
        session.delete_playlist("no-such-playlist");
        assert_eq!(session.library().playlists().len(), 1);
        assert_eq!(session.library().playlists()[0].id, keep.id);
    }

    let session = fixture.launch(None).expect("Should relaunch");
    let names: Vec<_> = session
        .library()
        .playlists()
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["Keep"]);
}

#[test]
fn test_ids_stay_unique_after_restart() {
    let fixture = TestFixture::new().expect("Should create fixture");

    let first = {
        let mut session = fixture.launch(None).expect("Should launch");
        session.create_playlist("One", None).id
    };

    let mut session = fixture.launch(None).expect("Should relaunch");
    let second = session.create_playlist("Two", None).id;
    assert_ne!(first, second);
}

// =============================================================================
// Storage Recovery
// =============================================================================

#[test]
fn test_corrupt_storage_starts_empty() {
    let fixture = TestFixture::new().expect("Should create fixture");
    fixture.write_key("groovify-playlists", "{not json");
    fixture.write_key("groovify-recently-played", "42");

    let mut session = fixture.launch(None).expect("Should launch");
    assert!(session.library().playlists().is_empty());
    assert!(session.library().recently_played().is_empty());

    // The store keeps working after a bad load.
    session.create_playlist("Fresh", None);
    let session = fixture.launch(None).expect("Should relaunch");
    assert_eq!(session.library().playlists().len(), 1);
}

#[test]
fn test_legacy_epoch_timestamp_is_accepted() {
    let fixture = TestFixture::new().expect("Should create fixture");
    fixture.write_key(
        "groovify-playlists",
        r#"[{"id":"1700000000000","name":"Old","songs":[],"coverUrl":"/c.png","createdAt":1700000000000}]"#,
    );

    let session = fixture.launch(None).expect("Should launch");
    let playlist = session
        .library()
        .playlist("1700000000000")
        .expect("Playlist should load");
    assert_eq!(playlist.created_at.timestamp_millis(), 1_700_000_000_000);
}

// =============================================================================
// Catalog
// =============================================================================

#[test]
fn test_catalog_from_file_source() {
    let fixture = TestFixture::new().expect("Should create fixture");
    let path = fixture.write_song_list(&[
        Song::new("1", "Impostor", "Nobody", "/fake.mp3"),
        Song::new("10", "Take Five", "Dave Brubeck", "/music/take-five.mp3").with_genre("Jazz"),
    ]);
    let source = FileSource::new(path);

    let session = fixture.launch(Some(&source)).expect("Should launch");
    assert_eq!(session.catalog().len(), 5);
    assert_eq!(builtin(&session, "1").title, "Not Like Us");
    assert_eq!(session.search("brubeck").len(), 1);
    assert!(session.catalog().genres().contains(&"Jazz"));
}

#[test]
fn test_missing_catalog_source_falls_back_to_builtin() {
    let fixture = TestFixture::new().expect("Should create fixture");
    let config = CatalogConfig {
        source: Some(fixture.dir.path().join("absent.json").display().to_string()),
        ..CatalogConfig::default()
    };
    let source = source_from_config(&config);

    let session = fixture.launch(source.as_deref()).expect("Should launch");
    assert_eq!(session.catalog().len(), 4);
}

// =============================================================================
// Playback Flow
// =============================================================================

#[test]
fn test_playlist_playback_with_repeat_all() {
    let fixture = TestFixture::new().expect("Should create fixture");
    let mut session = fixture.launch(None).expect("Should launch");

    let playlist = session.create_playlist("Loop", None);
    let first = builtin(&session, "3");
    let second = builtin(&session, "4");
    session.add_song_to_playlist(&playlist.id, first);
    session.add_song_to_playlist(&playlist.id, second);
    assert_eq!(session.cycle_repeat(), RepeatMode::All);

    assert!(session.play_playlist(&playlist.id));
    session.handle_transport_event(TransportEvent::Ended);
    session.handle_transport_event(TransportEvent::Ended);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.current_song.map(|s| s.id), Some("3".to_string()));
    assert!(snapshot.is_playing);
    assert_eq!(snapshot.queue.len(), 2);

    let history: Vec<_> = snapshot
        .recently_played
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(history, vec!["3", "4"]);
}
