//! Library store: playlists and recently-played history.
//!
//! Every mutation is written through to the [`PersistenceGateway`]
//! immediately, as a full re-serialization of the affected collection.
//! Before [`LibraryStore::load`] runs nothing is written; changes made in
//! that window are folded into the stored data when it loads.
//! Operations naming a playlist that does not exist are silent no-ops.
//!
//! Playlist names are not validated here. Rejecting empty or
//! whitespace-only names is the caller's job; the store creates whatever it
//! is asked to create.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::persistence::PersistenceGateway;
use crate::playback::PlaybackEvent;
use crate::playlist::{Playlist, PlaylistIdGenerator};
use crate::song::Song;

/// Owns playlists and the recently-played history.
#[derive(Debug)]
pub struct LibraryStore {
    playlists: Vec<Playlist>,
    recently_played: Vec<Song>,
    history_capacity: usize,
    ids: PlaylistIdGenerator,
    persistence: PersistenceGateway,
    loaded: bool,
}

impl LibraryStore {
    /// Create an empty store writing through to `persistence`.
    ///
    /// Nothing is read until [`load`](Self::load) is called; the empty store
    /// is fully usable before that.
    #[must_use]
    pub fn new(persistence: PersistenceGateway) -> Self {
        Self {
            playlists: Vec::new(),
            recently_played: Vec::new(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            ids: PlaylistIdGenerator::new(),
            persistence,
            loaded: false,
        }
    }

    /// Set how many recently-played entries are kept (minimum 1).
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    /// Load stored playlists and history.
    ///
    /// Playlists created and songs played before this call are kept on top
    /// of the stored data, and the merged result is saved once.
    pub fn load(&mut self) {
        let early_playlists = std::mem::take(&mut self.playlists);
        let early_history = std::mem::take(&mut self.recently_played);

        self.playlists = self.persistence.load_playlists();
        for playlist in &mut self.playlists {
            dedup_by_id(&mut playlist.songs);
            self.ids.observe(&playlist.id);
        }

        let mut history = self.persistence.load_recently_played();
        dedup_by_id(&mut history);
        history.truncate(self.history_capacity);
        self.recently_played = history;
        self.loaded = true;

        info!(
            "Loaded {} playlists and {} recently played songs",
            self.playlists.len(),
            self.recently_played.len()
        );

        if !early_playlists.is_empty() {
            debug!("Keeping {} playlists created before load", early_playlists.len());
            for mut playlist in early_playlists {
                if self.playlist(&playlist.id).is_some() {
                    playlist.id = self.ids.next_id(Utc::now());
                }
                self.playlists.push(playlist);
            }
            self.persist_playlists();
        }

        if !early_history.is_empty() {
            for song in early_history.into_iter().rev() {
                self.push_played(song);
            }
            self.persist_recently_played();
        }
    }

    /// Create an empty playlist and return a copy of it.
    pub fn create_playlist(&mut self, name: &str, description: Option<&str>) -> Playlist {
        let now = Utc::now();
        let id = self.ids.next_id(now);
        let playlist = Playlist::new(id, name, description.map(str::to_string), now);

        self.playlists.push(playlist.clone());
        info!("Created playlist '{}' ({})", playlist.name, playlist.id);
        self.persist_playlists();
        playlist
    }

    /// Append `song` to a playlist, moving an existing entry to the tail.
    pub fn add_song_to_playlist(&mut self, playlist_id: &str, song: Song) {
        let Some(playlist) = self.playlist_mut(playlist_id) else {
            debug!("add_song_to_playlist ignored: unknown playlist {}", playlist_id);
            return;
        };
        debug!("Adding '{}' to playlist '{}'", song.id, playlist.name);
        playlist.add_song(song);
        self.persist_playlists();
    }

    /// Remove every entry of `song_id` from a playlist.
    pub fn remove_song_from_playlist(&mut self, playlist_id: &str, song_id: &str) {
        let Some(playlist) = self.playlist_mut(playlist_id) else {
            debug!(
                "remove_song_from_playlist ignored: unknown playlist {}",
                playlist_id
            );
            return;
        };
        if !playlist.remove_song(song_id) {
            debug!("Song '{}' not in playlist '{}'", song_id, playlist.name);
        }
        self.persist_playlists();
    }

    /// Delete a playlist.
    pub fn delete_playlist(&mut self, playlist_id: &str) {
        let before = self.playlists.len();
        self.playlists.retain(|p| p.id != playlist_id);
        if self.playlists.len() == before {
            debug!("delete_playlist ignored: unknown playlist {}", playlist_id);
            return;
        }
        info!("Deleted playlist {}", playlist_id);
        self.persist_playlists();
    }

    /// Put `song` at the front of the history, dropping any older entry for it.
    pub fn record_played(&mut self, song: Song) {
        self.push_played(song);
        self.persist_recently_played();
    }

    /// React to a playback event. Only song changes touch the library.
    pub fn handle_playback_event(&mut self, event: &PlaybackEvent) {
        if let PlaybackEvent::SongStarted(song) = event {
            self.record_played(song.clone());
        }
    }

    /// All playlists in creation order.
    #[must_use]
    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    /// Look up a playlist by identifier.
    #[must_use]
    pub fn playlist(&self, playlist_id: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == playlist_id)
    }

    /// The first `limit` playlists, as shown on the home view.
    #[must_use]
    pub fn featured_playlists(&self, limit: usize) -> &[Playlist] {
        &self.playlists[..limit.min(self.playlists.len())]
    }

    /// Recently-played history, most recent first.
    #[must_use]
    pub fn recently_played(&self) -> &[Song] {
        &self.recently_played
    }

    /// The `limit` most recently played songs.
    #[must_use]
    pub fn recent(&self, limit: usize) -> &[Song] {
        &self.recently_played[..limit.min(self.recently_played.len())]
    }

    /// Maximum history length.
    #[must_use]
    pub const fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    fn playlist_mut(&mut self, playlist_id: &str) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|p| p.id == playlist_id)
    }

    fn push_played(&mut self, song: Song) {
        self.recently_played.retain(|s| s.id != song.id);
        self.recently_played.insert(0, song);
        self.recently_played.truncate(self.history_capacity);
    }

    fn persist_playlists(&mut self) {
        if !self.loaded {
            return;
        }
        if let Err(e) = self.persistence.save_playlists(&self.playlists) {
            warn!("Failed to save playlists: {}", e);
        }
    }

    fn persist_recently_played(&mut self) {
        if !self.loaded {
            return;
        }
        if let Err(e) = self.persistence.save_recently_played(&self.recently_played) {
            warn!("Failed to save recently played: {}", e);
        }
    }
}

fn dedup_by_id(songs: &mut Vec<Song>) {
    let mut seen = std::collections::HashSet::new();
    songs.retain(|s| seen.insert(s.id.clone()));
}
