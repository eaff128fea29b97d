use serde::Deserialize;

/// Raw (artist, title) pair exactly as received from a source.
///
/// This is the record of truth stored in the database; normalized variants
/// are only used to query external indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct SongKey {
    pub artist: String,
    pub title: String,
}

impl SongKey {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

impl std::fmt::Display for SongKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

pub type TrackId = i64;

/// A track row joined with its artist name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    pub id: TrackId,
    pub key: SongKey,
}

/// Fields filled by the audio-metadata source.
///
/// Saved as a whole: a `None` here overwrites whatever the track had.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioMetadata {
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub tempo: Option<i64>,
    pub album: Option<String>,
    pub thumbnail: Option<String>,
}

/// One ranked line of a chart page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartEntry {
    pub rank: u32,
    pub key: SongKey,
}

/// First hit of a song search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub artist_names: Option<String>,
    pub url: Option<String>,
}
