//! The session: one explicit container for all client state.
//!
//! A [`Session`] owns the catalog, search index, library store, playback
//! session and audio transport. It is usable as soon as it is constructed
//! (built-in songs, empty library); [`Session::start`] then loads persisted
//! data and the fetched catalog.
//!
//! Playback never calls the library directly. After each playback operation
//! the session drains the playback event stream and routes each event:
//! song changes are recorded in the history and loaded into the transport,
//! play/pause flips are forwarded to the transport, and every event is
//! copied to subscribers.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, SongSource, fetch_songs};
use crate::config::AppConfig;
use crate::error::Result;
use crate::library::LibraryStore;
use crate::persistence::PersistenceGateway;
use crate::playback::{PlaybackEvent, PlaybackSession, PlaybackStatus, RepeatMode};
use crate::playlist::Playlist;
use crate::search::SearchIndex;
use crate::song::{Song, builtin_songs};
use crate::storage::{FileStore, KeyValueStore};
use crate::transport::{AudioTransport, TransportEvent};

/// Point-in-time copy of session state for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Current song, if any.
    pub current_song: Option<Song>,
    /// Navigation queue.
    pub queue: Vec<Song>,
    /// Coarse playback state.
    pub status: PlaybackStatus,
    /// Whether the play flag is set.
    pub is_playing: bool,
    /// Repeat mode.
    pub repeat_mode: RepeatMode,
    /// Volume, 0-100.
    pub volume: u8,
    /// Position in seconds.
    pub position: f64,
    /// Duration in seconds (0 when unknown).
    pub duration: f64,
    /// All playlists.
    pub playlists: Vec<Playlist>,
    /// Recently-played history, most recent first.
    pub recently_played: Vec<Song>,
}

/// All client state, driven by a single logical actor.
pub struct Session<T: AudioTransport> {
    catalog: Catalog,
    search: SearchIndex,
    library: LibraryStore,
    playback: PlaybackSession,
    transport: T,
    subscribers: Vec<mpsc::UnboundedSender<PlaybackEvent>>,
}

impl<T: AudioTransport> Session<T> {
    /// Create a session over `store` and `transport`.
    ///
    /// Nothing is loaded yet: the catalog holds only the built-in songs and
    /// the library is empty until [`start`](Self::start).
    pub fn new(config: &AppConfig, store: impl KeyValueStore + 'static, transport: T) -> Self {
        let library = LibraryStore::new(PersistenceGateway::new(store))
            .with_history_capacity(config.history_capacity);
        let mut playback = PlaybackSession::new();
        playback.set_volume(config.default_volume);

        let catalog = Catalog::merge(builtin_songs(), Vec::new());
        let search = SearchIndex::new(&catalog);

        Self {
            catalog,
            search,
            library,
            playback,
            transport,
            subscribers: Vec::new(),
        }
    }

    /// Create a session persisting to files under the configured storage directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created.
    pub fn open(config: &AppConfig, transport: T) -> Result<Self> {
        let store = FileStore::new(&config.storage_directory)?;
        Ok(Self::new(config, store, transport))
    }

    /// Load persisted playlists and history, then build the catalog.
    ///
    /// Failures in either step are logged and leave that part empty.
    pub fn start(&mut self, source: Option<&dyn SongSource>) {
        info!("Starting session");
        self.library.load();
        let level = self.volume_level();
        self.command("set_volume", |t| t.set_volume(level));
        self.refresh_catalog(source);
    }

    /// Fetch the dynamic song list again and rebuild the catalog.
    pub fn refresh_catalog(&mut self, source: Option<&dyn SongSource>) {
        let fetched = fetch_songs(source);
        self.install_catalog(fetched);
    }

    /// Rebuild the catalog from the built-in songs plus `fetched`.
    ///
    /// For fetches completed outside the session. The last call wins.
    pub fn install_catalog(&mut self, fetched: Vec<Song>) {
        self.catalog = Catalog::merge(builtin_songs(), fetched);
        self.search = SearchIndex::new(&self.catalog);
        info!("Catalog ready with {} songs", self.catalog.len());
    }

    /// Receive a copy of every playback event from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<PlaybackEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    // --- playback ---------------------------------------------------------

    /// Play `song` with `context` as the new queue.
    pub fn play(&mut self, song: Song, context: Vec<Song>) {
        self.playback.play(song, context);
        self.route_events();
    }

    /// Play `song` with the whole catalog as the queue.
    pub fn play_from_catalog(&mut self, song: Song) {
        let context = self.catalog.songs().to_vec();
        self.play(song, context);
    }

    /// Play a playlist from its first song. Returns false if it is missing or empty.
    pub fn play_playlist(&mut self, playlist_id: &str) -> bool {
        let Some(songs) = self.library.playlist(playlist_id).map(|p| p.songs.clone()) else {
            debug!("play_playlist ignored: unknown playlist {}", playlist_id);
            return false;
        };
        self.play_first(songs)
    }

    /// Play every catalog song of `genre`. Returns false if there are none.
    pub fn play_genre(&mut self, genre: &str) -> bool {
        let songs = self.catalog.songs_in_genre(genre);
        self.play_first(songs)
    }

    /// Flip play/pause. Returns false when nothing is loaded.
    pub fn toggle_play(&mut self) -> bool {
        let toggled = self.playback.toggle_play();
        self.route_events();
        toggled
    }

    /// Advance to the next queued song.
    pub fn next(&mut self) -> bool {
        let moved = self.playback.next();
        self.route_events();
        moved
    }

    /// Go back to the previous queued song.
    pub fn previous(&mut self) -> bool {
        let moved = self.playback.previous();
        self.route_events();
        moved
    }

    /// Append a song to the queue unless already queued.
    pub fn enqueue(&mut self, song: Song) -> bool {
        let added = self.playback.enqueue(song);
        self.route_events();
        added
    }

    /// Seek the current song. Ignored when idle.
    pub fn seek(&mut self, position: f64) {
        if self.playback.status() == PlaybackStatus::Idle {
            return;
        }
        self.playback.update_position(position);
        let position = self.playback.position();
        self.command("seek", |t| t.seek(position));
    }

    /// Set the volume (0-100) and forward it to the transport.
    pub fn set_volume(&mut self, volume: u8) -> u8 {
        let volume = self.playback.set_volume(volume);
        let level = self.volume_level();
        self.command("set_volume", |t| t.set_volume(level));
        volume
    }

    /// Advance the repeat mode.
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.playback.cycle_repeat()
    }

    /// React to a notification from the audio element.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::TimeUpdate(position) => self.playback.update_position(position),
            TransportEvent::MetadataLoaded(duration) => self.playback.set_duration(duration),
            TransportEvent::Ended => self.on_ended(),
        }
    }

    // --- library ----------------------------------------------------------

    /// Create a playlist. The caller validates the name.
    pub fn create_playlist(&mut self, name: &str, description: Option<&str>) -> Playlist {
        self.library.create_playlist(name, description)
    }

    /// Add a song to a playlist.
    pub fn add_song_to_playlist(&mut self, playlist_id: &str, song: Song) {
        self.library.add_song_to_playlist(playlist_id, song);
    }

    /// Remove a song from a playlist.
    pub fn remove_song_from_playlist(&mut self, playlist_id: &str, song_id: &str) {
        self.library.remove_song_from_playlist(playlist_id, song_id);
    }

    /// Delete a playlist.
    pub fn delete_playlist(&mut self, playlist_id: &str) {
        self.library.delete_playlist(playlist_id);
    }

    // --- queries ----------------------------------------------------------

    /// Search the catalog.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Song> {
        self.search.search(query)
    }

    /// The merged catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The library store.
    #[must_use]
    pub const fn library(&self) -> &LibraryStore {
        &self.library
    }

    /// The playback session.
    #[must_use]
    pub const fn playback(&self) -> &PlaybackSession {
        &self.playback
    }

    /// The audio transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the audio transport.
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Copy out the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_song: self.playback.current_song().cloned(),
            queue: self.playback.queue().to_vec(),
            status: self.playback.status(),
            is_playing: self.playback.is_playing(),
            repeat_mode: self.playback.repeat_mode(),
            volume: self.playback.volume(),
            position: self.playback.position(),
            duration: self.playback.duration(),
            playlists: self.library.playlists().to_vec(),
            recently_played: self.library.recently_played().to_vec(),
        }
    }

    fn play_first(&mut self, songs: Vec<Song>) -> bool {
        let Some(first) = songs.first().cloned() else {
            return false;
        };
        self.play(first, songs);
        true
    }

    fn on_ended(&mut self) {
        if self.playback.status() == PlaybackStatus::Idle {
            return;
        }

        match self.playback.repeat_mode() {
            RepeatMode::One => {
                self.playback.update_position(0.0);
                self.command("seek", |t| t.seek(0.0));
                self.command("play", T::play);
            }
            RepeatMode::All => {
                if !self.playback.next() && !self.playback.restart_queue() {
                    debug!("Nothing queued to repeat");
                    self.playback.set_playing(false);
                }
            }
            RepeatMode::Off => {
                if !self.playback.next() {
                    debug!("Reached the end of the queue");
                    self.playback.set_playing(false);
                }
            }
        }
        self.route_events();
    }

    fn route_events(&mut self) {
        let events = self.playback.drain_events();
        let song_started = events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::SongStarted(_)));

        for event in &events {
            self.library.handle_playback_event(event);

            match event {
                PlaybackEvent::SongStarted(song) => {
                    self.command("load", |t| t.load(&song.audio_url));
                }
                // A song change in the same batch decides play/pause below.
                PlaybackEvent::PlayStateChanged { is_playing } if !song_started => {
                    if *is_playing {
                        self.command("play", T::play);
                    } else {
                        self.command("pause", T::pause);
                    }
                }
                _ => {}
            }

            self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }

        if song_started && self.playback.is_playing() {
            self.command("play", T::play);
        }
    }

    fn volume_level(&self) -> f32 {
        f32::from(self.playback.volume()) / 100.0
    }

    fn command(&mut self, name: &str, f: impl FnOnce(&mut T) -> Result<()>) {
        if let Err(e) = f(&mut self.transport) {
            warn!("Audio transport {} failed: {}", name, e);
        }
    }
}

impl<T: AudioTransport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("catalog_len", &self.catalog.len())
            .field("library", &self.library)
            .field("playback", &self.playback)
            .finish_non_exhaustive()
    }
}
