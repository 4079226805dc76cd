//! Playlist records.
//!
//! A playlist is an ordered, de-duplicated sequence of songs keyed by song
//! identifier. Playlists are owned by the [`LibraryStore`](crate::LibraryStore);
//! this module holds the record itself, its identifier generator and its
//! on-disk timestamp format.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::song::Song;

/// Cover reference given to newly created playlists.
pub const DEFAULT_PLAYLIST_COVER: &str = "/placeholder.svg?height=300&width=300&text=Playlist";

/// A user-named, user-ordered collection of songs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    /// Unique identifier (millisecond timestamp at creation).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Songs in insertion order, unique by identifier.
    #[serde(default)]
    pub songs: Vec<Song>,
    /// Cover reference.
    #[serde(default = "default_cover")]
    pub cover_url: String,
    /// Creation time, millisecond precision.
    #[serde(
        default = "load_time",
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: DateTime<Utc>,
}

fn default_cover() -> String {
    DEFAULT_PLAYLIST_COVER.to_string()
}

impl Playlist {
    /// Create an empty playlist.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description,
            songs: Vec::new(),
            cover_url: default_cover(),
            created_at: truncate_to_millis(created_at),
        }
    }

    /// Append a song, moving an existing entry with the same identifier to the tail.
    pub fn add_song(&mut self, song: Song) {
        self.songs.retain(|s| s.id != song.id);
        self.songs.push(song);
    }

    /// Remove every entry with the given identifier. Returns whether anything was removed.
    pub fn remove_song(&mut self, song_id: &str) -> bool {
        let before = self.songs.len();
        self.songs.retain(|s| s.id != song_id);
        self.songs.len() != before
    }

    /// Whether the playlist holds a song with this identifier.
    #[must_use]
    pub fn contains(&self, song_id: &str) -> bool {
        self.songs.iter().any(|s| s.id == song_id)
    }

    /// Number of songs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Whether the playlist has no songs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

const MAX_CLOCK_SKEW_MS: i64 = 24 * 60 * 60 * 1000;

/// Generates collision-free, monotonically increasing playlist identifiers.
///
/// Identifiers are the creation time in epoch milliseconds, bumped past the
/// last issued (or observed) value when two playlists land in the same
/// millisecond.
#[derive(Debug, Clone, Default)]
pub struct PlaylistIdGenerator {
    last: i64,
}

impl PlaylistIdGenerator {
    /// Create a generator with no history.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Issue the identifier for a playlist created at `now`.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let id = now.timestamp_millis().max(self.last.saturating_add(1));
        self.last = id;
        id.to_string()
    }

    /// Record an identifier that already exists so it is never reissued.
    ///
    /// Ids more than a day ahead of the clock cannot come from this
    /// generator and are ignored.
    pub fn observe(&mut self, id: &str) {
        let horizon = Utc::now().timestamp_millis() + MAX_CLOCK_SKEW_MS;
        match id.parse::<i64>() {
            Ok(value) if value <= horizon => self.last = self.last.max(value),
            Ok(value) => warn!("Ignoring playlist id {} from the far future", value),
            Err(_) => {}
        }
    }
}

/// Drop sub-millisecond precision so timestamps survive a textual round-trip.
#[must_use]
pub fn truncate_to_millis(time: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(time.timestamp_millis()).unwrap_or(time)
}

/// Parse a persisted timestamp: an RFC 3339 string or epoch milliseconds.
#[must_use]
pub fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|time| time.with_timezone(&Utc)),
        serde_json::Value::Number(number) => number
            .as_i64()
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn load_time() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

fn serialize_timestamp<S: Serializer>(
    time: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<DateTime<Utc>, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(parse_timestamp(&raw).unwrap_or_else(|| {
        warn!("Malformed playlist timestamp {}, using load time", raw);
        load_time()
    }))
}
