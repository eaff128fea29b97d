use std::time::Duration;

use log::info;

use crate::{
    domain::{normalize::lyrics_candidates, track::SongKey},
    ingest::pause,
    sources::{Connector, Fetch, first_found},
    storage::{error::StorageError, operations::Storage},
};

#[derive(Debug, Clone)]
pub struct LyricsIngestOptions {
    pub pause: Duration,
    /// treat "timed out on every attempt" like "not found"
    pub sentinel_on_transient: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LyricsIngestReport {
    pub attempted: usize,
    pub saved: usize,
    pub marked_missing: usize,
    /// left untouched, picked up again next run
    pub deferred: usize,
}

/// Looks up lyrics for every track that has no lyrics row yet.
///
/// The raw pair is tried first, then the normalized pair if it differs.
/// A track with no lyrics anywhere gets the "no lyrics" marker and is
/// excluded from later runs.
pub fn ingest_lyrics<L>(
    storage: &Storage,
    source: &L,
    options: &LyricsIngestOptions,
) -> Result<LyricsIngestReport, StorageError>
where
    L: Connector<Query = SongKey, Record = String> + ?Sized,
{
    let tracks = storage.tracks_missing_lyrics()?;
    info!("tracks missing lyrics: {}", tracks.len());

    let mut report = LyricsIngestReport::default();
    for track in tracks {
        report.attempted += 1;
        info!("fetching lyrics: {}", track.key);

        let candidates = lyrics_candidates(&track.key);
        let result = first_found(source, &candidates);

        match result {
            Fetch::Found(text) => {
                storage.save_lyrics(track.id, &text)?;
                info!("  saved lyrics");
                report.saved += 1;
            }
            Fetch::Transient if !options.sentinel_on_transient => {
                info!("  timed out, will retry next run");
                report.deferred += 1;
            }
            Fetch::Transient | Fetch::Missing => {
                if storage.mark_lyrics_missing(track.id)?.is_inserted() {
                    info!("  no lyrics after {} attempt(s), marked as missing", candidates.len());
                    report.marked_missing += 1;
                }
            }
        }

        pause(options.pause);
    }

    Ok(report)
}
