//! Turns external records into idempotent database mutations.
//!
//! Each step works on one open [`Storage`](crate::storage::operations::Storage),
//! issues lookups one at a time and sleeps a fixed amount after every lookup.

use std::time::Duration;

pub mod audio;
pub mod charts;
pub mod lyrics;
pub mod tracks;

/// Fixed sleep between external lookups
pub(crate) fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{
        fakes::FakeSource,
        lyrics::{LyricsIngestOptions, ingest_lyrics},
        tracks::{TrackIngestOptions, ingest_tracks},
    };
    use crate::{
        domain::track::{SearchHit, SongKey},
        sources::Fetch,
        storage::{
            operations::{LyricsState, tests::setup_storage},
            schema,
        },
    };

    #[test]
    fn test_empty_database_to_ingested_catalog() -> anyhow::Result<()> {
        let storage = setup_storage()?;
        // schema creation is repeatable
        schema::init(&storage.db)?;

        let artist = storage.ensure_artist("Wham!")?;
        storage.insert_track(artist, "Last Christmas", None)?;

        let songs = vec![
            SongKey::new("Mariah Carey", "All I Want For Christmas Is You"),
            SongKey::new("Wham!", "Last Christmas"),
            SongKey::new("Brenda Lee", "Rockin' Around the Christmas Tree"),
        ];
        let search: FakeSource<str, SearchHit> = FakeSource::new();
        let options = TrackIngestOptions {
            batch_limit: 25,
            target_total: 100,
            require_match: false,
            pause: Duration::ZERO,
        };

        let report = ingest_tracks(&storage, &songs, &search, &options)?;

        assert_eq!(report.inserted, 2);
        assert_eq!(report.already_present, 1);
        assert_eq!(storage.track_count()?, 3);
        assert_eq!(storage.artist_count()?, 3);
        // the already present pair never reaches the search source
        assert!(!search.calls().iter().any(|c| c.contains("Last Christmas")));

        let lyrics: FakeSource<SongKey, String> = FakeSource::new().answer(
            "Mariah Carey|All I Want For Christmas Is You",
            Fetch::Found("I don't want a lot for Christmas".to_string()),
        );
        let report = ingest_lyrics(
            &storage,
            &lyrics,
            &LyricsIngestOptions {
                pause: Duration::ZERO,
                sentinel_on_transient: true,
            },
        )?;
        assert_eq!(report.saved, 1);
        assert_eq!(report.marked_missing, 2);
        assert!(storage.tracks_missing_lyrics()?.is_empty());

        let mariah = storage
            .find_track_id(&SongKey::new("Mariah Carey", "All I Want For Christmas Is You"))?
            .unwrap();
        assert!(matches!(storage.lyrics_state(mariah)?, LyricsState::Text(_)));

        Ok(())
    }
}
