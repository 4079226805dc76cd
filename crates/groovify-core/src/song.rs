//! Song records and the built-in static song set.

use serde::{Deserialize, Serialize};

/// A single song in the catalog.
///
/// Songs are value types: they are looked up and cloned, never mutated in
/// place. Field names serialize in camelCase so that persisted data and
/// fetched `songs.json` files share one shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// Unique identifier within the merged catalog.
    pub id: String,
    /// Song title.
    pub title: String,
    /// Performing artist(s).
    pub artist: String,
    /// Album name.
    #[serde(default)]
    pub album: String,
    /// Cover art reference.
    #[serde(default)]
    pub cover_url: String,
    /// Audio source reference handed to the transport.
    pub audio_url: String,
    /// Genre label, possibly a comma-separated list.
    #[serde(default)]
    pub genre: String,
    /// Release year.
    #[serde(default)]
    pub year: u16,
}

impl Song {
    /// Create a song with the required fields; the rest start empty.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        audio_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: String::new(),
            cover_url: String::new(),
            audio_url: audio_url.into(),
            genre: String::new(),
            year: 0,
        }
    }

    /// Set the album.
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    /// Set the cover reference.
    #[must_use]
    pub fn with_cover_url(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = cover_url.into();
        self
    }

    /// Set the genre.
    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = genre.into();
        self
    }

    /// Set the release year.
    #[must_use]
    pub const fn with_year(mut self, year: u16) -> Self {
        self.year = year;
        self
    }
}

/// The static song set shipped with the client.
///
/// These entries always win over fetched songs sharing an identifier.
#[must_use]
pub fn builtin_songs() -> Vec<Song> {
    vec![
        Song::new("1", "Not Like Us", "Kendrick Lamar", "/music/Not Like Us.mp3")
            .with_album("Single")
            .with_cover_url("/music/covers/not-like-us.webp")
            .with_genre("Hip-Hop")
            .with_year(2024),
        Song::new(
            "2",
            "Chuttamalle",
            "Shilpa Rao, Anirudh",
            "/music/Chuttamalle.mp3",
        )
        .with_album("Devara")
        .with_cover_url("/music/covers/chuttamalle.webp")
        .with_genre("Melody")
        .with_year(2024),
        Song::new(
            "3",
            "Ae Dil Hai Mushkil",
            "Arijit Singh, Pritam",
            "/music/Ae Dil Hai Mushkil - Title Track.mp3",
        )
        .with_album("Ae Dil Hai Mushkil")
        .with_cover_url("/music/covers/ae-dil-hai-mushkil.webp")
        .with_genre("Romance, Heartbreak")
        .with_year(2016),
        Song::new(
            "4",
            "I Ain't Worried - OneRepublic",
            "OneRepublic",
            "/music/I Aint Worried - One Republic.mp3",
        )
        .with_album("Topgun: Maverick")
        .with_cover_url("/music/covers/I-Ain't-Worried.webp")
        .with_genre("Pop, Rock")
        .with_year(2022),
    ]
}
