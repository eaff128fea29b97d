use rusqlite::Connection;

pub mod tables {
    pub const ARTISTS: &str = "artists";
    pub const TRACKS: &str = "tracks";
    pub const LYRICS: &str = "lyrics";
    pub const CHART_POPULARITY: &str = "chart_popularity";

    #[cfg(test)]
    pub const ALL_TABLES: &[&str] = &[ARTISTS, TRACKS, LYRICS, CHART_POPULARITY];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const ARTIST_ID: &str = "artist_id";
    pub const TITLE: &str = "title";
    pub const GENIUS_SONG_ID: &str = "genius_song_id";
    pub const GENRE: &str = "genre";
    pub const MOOD: &str = "mood";
    pub const TEMPO: &str = "tempo";
    pub const ALBUM_NAME: &str = "album_name";
    pub const ALBUM_THUMB: &str = "album_thumb";
    pub const TRACK_ID: &str = "track_id";
    pub const LYRICS_TEXT: &str = "lyrics_text";
    pub const CHART_NAME: &str = "chart_name";
    pub const CHART_POSITION: &str = "chart_position";
    pub const CHART_DATE: &str = "chart_date";
}

// A lyrics row with NULL text marks a permanently failed lookup.
const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS artists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS tracks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    artist_id INTEGER NOT NULL REFERENCES artists(id),
    title TEXT NOT NULL,
    genius_song_id INTEGER,
    genre TEXT,
    mood TEXT,
    tempo INTEGER,
    album_name TEXT,
    album_thumb TEXT,
    UNIQUE (artist_id, title)
);

CREATE TABLE IF NOT EXISTS lyrics (
    track_id INTEGER PRIMARY KEY REFERENCES tracks(id),
    lyrics_text TEXT
);

CREATE TABLE IF NOT EXISTS chart_popularity (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    track_id INTEGER NOT NULL REFERENCES tracks(id),
    chart_name TEXT NOT NULL,
    chart_position INTEGER NOT NULL,
    chart_date TEXT NOT NULL,
    UNIQUE (track_id, chart_name, chart_date)
);
"#;

/// Creates missing tables; safe to run on an existing database
pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
