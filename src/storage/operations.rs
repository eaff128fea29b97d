use crate::{
    config,
    domain::track::{AudioMetadata, SongKey, TrackId, TrackRow},
    storage::{
        db,
        error::StorageError,
        schema::{columns, tables},
    },
};

use columns::*;
use rusqlite::{OptionalExtension, params};
use tables::*;

pub type ArtistId = i64;

/// Result of an insert-if-absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    /// the unique key was already taken; nothing changed
    AlreadyPresent,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

/// What the lyrics table knows about a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsState {
    NotAttempted,
    Text(String),
    /// looked up before and permanently failed
    NoLyrics,
}

/// Main structure that implements all storage logic
pub struct Storage {
    pub(crate) db: rusqlite::Connection,
}

impl Storage {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    pub fn track_count(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .db
            .query_row(&format!("SELECT COUNT(*) FROM {TRACKS}"), [], |row| {
                row.get(0)
            })?;
        Ok(count.max(0) as usize)
    }

    pub fn artist_count(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .db
            .query_row(&format!("SELECT COUNT(*) FROM {ARTISTS}"), [], |row| {
                row.get(0)
            })?;
        Ok(count.max(0) as usize)
    }

    /// Exact (artist name, title) match, no normalization
    pub fn find_track_id(&self, key: &SongKey) -> Result<Option<TrackId>, StorageError> {
        Ok(self
            .db
            .query_row(
                &format!(
                    "SELECT {TRACKS}.{ID}
                     FROM {TRACKS}
                     JOIN {ARTISTS} ON {TRACKS}.{ARTIST_ID} = {ARTISTS}.{ID}
                     WHERE {ARTISTS}.{NAME} = ?1 AND {TRACKS}.{TITLE} = ?2"
                ),
                params![key.artist, key.title],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn track_exists(&self, key: &SongKey) -> Result<bool, StorageError> {
        Ok(self.find_track_id(key)?.is_some())
    }

    /// Inserts the artist if unknown and returns its id either way
    pub fn ensure_artist(&self, name: &str) -> Result<ArtistId, StorageError> {
        self.db.execute(
            &format!("INSERT OR IGNORE INTO {ARTISTS} ({NAME}) VALUES (?1)"),
            params![name],
        )?;

        self.db
            .query_row(
                &format!("SELECT {ID} FROM {ARTISTS} WHERE {NAME} = ?1"),
                params![name],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StorageError::ArtistNotResolved(name.to_string()))
    }

    /// Insert-if-absent on (artist, title)
    pub fn insert_track(
        &self,
        artist_id: ArtistId,
        title: &str,
        genius_song_id: Option<i64>,
    ) -> Result<InsertOutcome, StorageError> {
        let changed = self.db.execute(
            &format!(
                "INSERT OR IGNORE INTO {TRACKS} ({ARTIST_ID}, {TITLE}, {GENIUS_SONG_ID})
                 VALUES (?1, ?2, ?3)"
            ),
            params![artist_id, title, genius_song_id],
        )?;

        Ok(if changed == 0 {
            InsertOutcome::AlreadyPresent
        } else {
            InsertOutcome::Inserted(self.db.last_insert_rowid())
        })
    }

    fn select_tracks<P: rusqlite::Params>(
        &self,
        filter: &str,
        params: P,
    ) -> Result<Vec<TrackRow>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {TRACKS}.{ID}, {ARTISTS}.{NAME}, {TRACKS}.{TITLE}
             FROM {TRACKS}
             JOIN {ARTISTS} ON {ARTISTS}.{ID} = {TRACKS}.{ARTIST_ID}
             {filter}
             ORDER BY {TRACKS}.{ID}"
        ))?;

        let rows = stmt
            .query_map(params, |row| {
                Ok(TrackRow {
                    id: row.get(0)?,
                    key: SongKey::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn track(&self, track_id: TrackId) -> Result<TrackRow, StorageError> {
        self.select_tracks(&format!("WHERE {TRACKS}.{ID} = ?1"), params![track_id])?
            .into_iter()
            .next()
            .ok_or(StorageError::TrackNotFound(track_id))
    }

    /// Tracks with no lyrics row at all. Tracks carrying the
    /// "no lyrics" marker are not returned.
    pub fn tracks_missing_lyrics(&self) -> Result<Vec<TrackRow>, StorageError> {
        self.select_tracks(&format!(
            "LEFT JOIN {LYRICS} ON {LYRICS}.{TRACK_ID} = {TRACKS}.{ID}
             WHERE {LYRICS}.{TRACK_ID} IS NULL"
        ), [])
    }

    /// Stores lyrics text, replacing a previous "no lyrics" marker
    pub fn save_lyrics(&self, track_id: TrackId, text: &str) -> Result<(), StorageError> {
        self.db.execute(
            &format!("INSERT OR REPLACE INTO {LYRICS} ({TRACK_ID}, {LYRICS_TEXT}) VALUES (?1, ?2)"),
            params![track_id, text],
        )?;
        Ok(())
    }

    /// Records a permanent lookup failure. Never overwrites stored text.
    pub fn mark_lyrics_missing(&self, track_id: TrackId) -> Result<InsertOutcome, StorageError> {
        let changed = self.db.execute(
            &format!("INSERT OR IGNORE INTO {LYRICS} ({TRACK_ID}, {LYRICS_TEXT}) VALUES (?1, NULL)"),
            params![track_id],
        )?;
        Ok(if changed == 0 {
            InsertOutcome::AlreadyPresent
        } else {
            InsertOutcome::Inserted(track_id)
        })
    }

    pub fn lyrics_state(&self, track_id: TrackId) -> Result<LyricsState, StorageError> {
        let row: Option<Option<String>> = self
            .db
            .query_row(
                &format!("SELECT {LYRICS_TEXT} FROM {LYRICS} WHERE {TRACK_ID} = ?1"),
                params![track_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(match row {
            None => LyricsState::NotAttempted,
            Some(None) => LyricsState::NoLyrics,
            Some(Some(text)) => LyricsState::Text(text),
        })
    }

    /// Insert-if-absent on (track, chart, date)
    pub fn insert_chart_entry(
        &self,
        track_id: TrackId,
        chart_name: &str,
        position: u32,
        chart_date: &str,
    ) -> Result<InsertOutcome, StorageError> {
        let changed = self.db.execute(
            &format!(
                "INSERT OR IGNORE INTO {CHART_POPULARITY}
                    ({TRACK_ID}, {CHART_NAME}, {CHART_POSITION}, {CHART_DATE})
                 VALUES (?1, ?2, ?3, ?4)"
            ),
            params![track_id, chart_name, position, chart_date],
        )?;

        Ok(if changed == 0 {
            InsertOutcome::AlreadyPresent
        } else {
            InsertOutcome::Inserted(self.db.last_insert_rowid())
        })
    }

    pub fn chart_entry_count(&self) -> Result<usize, StorageError> {
        let count: i64 = self.db.query_row(
            &format!("SELECT COUNT(*) FROM {CHART_POPULARITY}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    /// Tracks lacking any of genre, tempo or album
    pub fn tracks_missing_audio(&self) -> Result<Vec<TrackRow>, StorageError> {
        self.select_tracks(&format!(
            "WHERE {TRACKS}.{GENRE} IS NULL
                OR {TRACKS}.{TEMPO} IS NULL
                OR {TRACKS}.{ALBUM_NAME} IS NULL"
        ), [])
    }

    /// Overwrites all five audio fields; `None` clears a previous value
    pub fn save_audio_metadata(
        &self,
        track_id: TrackId,
        meta: &AudioMetadata,
    ) -> Result<(), StorageError> {
        let changed = self.db.execute(
            &format!(
                "UPDATE {TRACKS}
                 SET {GENRE} = ?1, {MOOD} = ?2, {TEMPO} = ?3, {ALBUM_NAME} = ?4, {ALBUM_THUMB} = ?5
                 WHERE {ID} = ?6"
            ),
            params![
                meta.genre,
                meta.mood,
                meta.tempo,
                meta.album,
                meta.thumbnail,
                track_id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::TrackNotFound(track_id));
        }
        Ok(())
    }

    pub fn audio_metadata(&self, track_id: TrackId) -> Result<AudioMetadata, StorageError> {
        self.db
            .query_row(
                &format!(
                    "SELECT {GENRE}, {MOOD}, {TEMPO}, {ALBUM_NAME}, {ALBUM_THUMB}
                     FROM {TRACKS} WHERE {ID} = ?1"
                ),
                params![track_id],
                |row| {
                    Ok(AudioMetadata {
                        genre: row.get(0)?,
                        mood: row.get(1)?,
                        tempo: row.get(2)?,
                        album: row.get(3)?,
                        thumbnail: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or(StorageError::TrackNotFound(track_id))
    }
}
