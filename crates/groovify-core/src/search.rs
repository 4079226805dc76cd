//! Case-insensitive substring search over the catalog.

use crate::catalog::Catalog;
use crate::song::Song;

/// Lowercased searchable fields of one song.
#[derive(Debug, Clone)]
struct Entry {
    song: Song,
    fields: [String; 4],
}

/// Search index derived from a [`Catalog`].
///
/// A song matches when its title, artist, album or genre contains the query,
/// ignoring case. Results keep catalog order; there is no ranking.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<Entry>,
}

impl SearchIndex {
    /// Build the index for `catalog`.
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        let entries = catalog
            .songs()
            .iter()
            .map(|song| Entry {
                fields: [
                    song.title.to_lowercase(),
                    song.artist.to_lowercase(),
                    song.album.to_lowercase(),
                    song.genre.to_lowercase(),
                ],
                song: song.clone(),
            })
            .collect();
        Self { entries }
    }

    /// Songs matching `query`. A blank query returns the whole catalog.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Song> {
        if query.trim().is_empty() {
            return self.entries.iter().map(|e| e.song.clone()).collect();
        }

        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.fields.iter().any(|field| field.contains(&needle)))
            .map(|e| e.song.clone())
            .collect()
    }

    /// Number of indexed songs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
