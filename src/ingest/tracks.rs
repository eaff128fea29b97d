use std::time::Duration;

use log::info;

use crate::{
    config::Batch,
    domain::track::{SearchHit, SongKey},
    ingest::pause,
    sources::{Connector, Fetch},
    storage::{
        error::StorageError,
        operations::{InsertOutcome, Storage},
    },
};

#[derive(Debug, Clone)]
pub struct TrackIngestOptions {
    /// most new tracks a single run may add
    pub batch_limit: usize,
    /// stop once the catalog holds this many tracks
    pub target_total: usize,
    /// skip songs the search source has no hit for
    pub require_match: bool,
    pub pause: Duration,
}

impl TrackIngestOptions {
    pub fn new(batch: &Batch, require_match: bool, pause: Duration) -> Self {
        Self {
            batch_limit: batch.track_limit,
            target_total: batch.track_target,
            require_match,
            pause,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrackIngestReport {
    pub inserted: usize,
    pub already_present: usize,
    pub unmatched: usize,
    pub total: usize,
}

/// Adds new (artist, title) pairs to the catalog.
///
/// Known pairs are skipped before any lookup. The run stops at
/// `batch_limit` new rows or when the catalog reaches `target_total`,
/// whichever comes first.
pub fn ingest_tracks<S>(
    storage: &Storage,
    songs: &[SongKey],
    search: &S,
    options: &TrackIngestOptions,
) -> Result<TrackIngestReport, StorageError>
where
    S: Connector<Query = str, Record = SearchHit> + ?Sized,
{
    let mut report = TrackIngestReport {
        total: storage.track_count()?,
        ..Default::default()
    };
    info!("current tracks in database: {}", report.total);

    if report.total >= options.target_total {
        info!("already reached target of {} tracks", options.target_total);
        return Ok(report);
    }

    for song in songs {
        if report.inserted >= options.batch_limit || report.total >= options.target_total {
            break;
        }

        if storage.track_exists(song)? {
            info!("already present: {song}");
            report.already_present += 1;
            continue;
        }

        let artist_id = storage.ensure_artist(&song.artist)?;

        let hit = if search.is_active() {
            let hit = search.lookup(&format!("{} {}", song.artist, song.title));
            pause(options.pause);
            hit
        } else {
            Fetch::Missing
        };
        let genius_id = match hit {
            Fetch::Found(hit) => hit.id,
            Fetch::Transient | Fetch::Missing if options.require_match => {
                info!("no search match, skipping: {song}");
                report.unmatched += 1;
                continue;
            }
            Fetch::Transient | Fetch::Missing => None,
        };

        match storage.insert_track(artist_id, &song.title, genius_id)? {
            InsertOutcome::Inserted(id) => {
                info!("saved: {song} (track_id={id})");
                report.inserted += 1;
                report.total += 1;
            }
            InsertOutcome::AlreadyPresent => {
                info!("already present: {song}");
                report.already_present += 1;
            }
        }
    }

    if report.total >= options.target_total {
        info!("reached target of {} tracks", options.target_total);
    }
    info!(
        "new tracks added this run: {}, total now: {}",
        report.inserted, report.total
    );
    Ok(report)
}
