//! Song catalog: the merged, read-only song set for a session.
//!
//! The catalog is the built-in static song list followed by every fetched
//! song whose identifier the static list does not already use. Fetching is
//! best effort: any failure yields an empty fetched set and is only logged.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::song::Song;

/// A place the dynamic part of the catalog is fetched from.
pub trait SongSource {
    /// Human-readable location, for logs.
    fn location(&self) -> String;

    /// Fetch the song list.
    fn fetch(&self) -> Result<Vec<Song>>;
}

/// Song list stored as a JSON array in a local file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SongSource for FileSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<Song>> {
        let content = fs::read_to_string(&self.path).map_err(|e| CatalogError::FetchFailed {
            location: self.location(),
            reason: e.to_string(),
        })?;
        parse_song_list(&self.location(), &content)
    }
}

/// Song list served as a JSON array over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    /// Create a source fetching `url`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl SongSource for HttpSource {
    fn location(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Vec<Song>> {
        let fetch_failed = |reason: String| CatalogError::FetchFailed {
            location: self.url.clone(),
            reason,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| fetch_failed(format!("Failed to create HTTP client: {e}")))?;

        let response = client
            .get(&self.url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| fetch_failed(e.to_string()))?;

        let body = response
            .text()
            .map_err(|e| fetch_failed(format!("Failed to read response body: {e}")))?;

        parse_song_list(&self.url, &body)
    }
}

/// Pick a source for the configured location: http(s) URLs go over the
/// network, anything else is treated as a file path.
#[must_use]
pub fn source_from_config(config: &CatalogConfig) -> Option<Box<dyn SongSource>> {
    let location = config.source.as_deref()?.trim();
    if location.is_empty() {
        return None;
    }
    if location.starts_with("http://") || location.starts_with("https://") {
        Some(Box::new(HttpSource::new(
            location,
            Duration::from_secs(config.fetch_timeout_secs),
        )))
    } else {
        Some(Box::new(FileSource::new(location)))
    }
}

fn parse_song_list(location: &str, content: &str) -> Result<Vec<Song>> {
    serde_json::from_str(content).map_err(|e| {
        CatalogError::InvalidData {
            location: location.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Fetch from `source`, degrading any failure to an empty list.
pub fn fetch_songs(source: Option<&dyn SongSource>) -> Vec<Song> {
    let Some(source) = source else {
        debug!("No catalog source configured");
        return Vec::new();
    };

    match source.fetch() {
        Ok(songs) => {
            info!("Fetched {} songs from {}", songs.len(), source.location());
            songs
        }
        Err(e) => {
            warn!("Catalog fetch failed, continuing without it: {}", e);
            Vec::new()
        }
    }
}

/// Build the session catalog from the built-in songs and `source`.
pub fn load_catalog(source: Option<&dyn SongSource>) -> Catalog {
    Catalog::merge(crate::song::builtin_songs(), fetch_songs(source))
}

/// How [`Catalog::sorted`] orders songs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Identifier, descending.
    #[default]
    Recent,
    /// Title, A to Z.
    Alphabetical,
    /// Artist, A to Z.
    Artist,
}

/// The merged, de-duplicated song set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    songs: Vec<Song>,
}

impl Catalog {
    /// Merge static and fetched songs.
    ///
    /// Static songs keep their order and always win on identifier clashes;
    /// fetched songs follow in their own order. Duplicates within the
    /// fetched list keep their first occurrence.
    #[must_use]
    pub fn merge(static_songs: Vec<Song>, fetched: Vec<Song>) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(static_songs.len() + fetched.len());
        let mut songs = Vec::with_capacity(static_songs.len() + fetched.len());

        for song in static_songs.into_iter().chain(fetched) {
            if seen.insert(song.id.clone()) {
                songs.push(song);
            } else {
                debug!("Skipping duplicate catalog entry '{}'", song.id);
            }
        }

        Self { songs }
    }

    /// All songs in catalog order.
    #[must_use]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Number of songs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Look up a song by identifier.
    #[must_use]
    pub fn get(&self, song_id: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == song_id)
    }

    /// Distinct genre labels in order of first appearance.
    #[must_use]
    pub fn genres(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.songs
            .iter()
            .map(|s| s.genre.as_str())
            .filter(|genre| seen.insert(*genre))
            .collect()
    }

    /// Songs whose genre label equals `genre` exactly.
    #[must_use]
    pub fn songs_in_genre(&self, genre: &str) -> Vec<Song> {
        self.songs
            .iter()
            .filter(|s| s.genre == genre)
            .cloned()
            .collect()
    }

    /// A copy of the catalog in the requested order (stable).
    #[must_use]
    pub fn sorted(&self, order: SortOrder) -> Vec<Song> {
        let mut songs = self.songs.clone();
        match order {
            SortOrder::Recent => songs.sort_by(|a, b| compare_text(&b.id, &a.id)),
            SortOrder::Alphabetical => songs.sort_by(|a, b| compare_text(&a.title, &b.title)),
            SortOrder::Artist => songs.sort_by(|a, b| compare_text(&a.artist, &b.artist)),
        }
        songs
    }

    /// The home view's "popular" picks: a fixed pseudo-shuffle keyed on each
    /// song's numeric identifier, truncated to `limit`.
    #[must_use]
    pub fn featured(&self, limit: usize) -> Vec<Song> {
        let mut songs = self.songs.clone();
        songs.sort_by_key(|s| featured_key(&s.id));
        songs.truncate(limit);
        songs
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// `(n * 9301 + 49297) % 233280`, where `n` is the identifier's leading
/// integer or 0 when it has none.
fn featured_key(id: &str) -> i64 {
    let seed = leading_integer(id).unwrap_or(0);
    (seed.wrapping_mul(9301).wrapping_add(49297)) % 233_280
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
