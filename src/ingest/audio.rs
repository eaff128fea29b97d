use std::time::Duration;

use log::info;

use crate::{
    domain::{normalize::audio_title_candidates, track::AudioMetadata},
    ingest::pause,
    sources::{Connector, Fetch, first_found},
    storage::{error::StorageError, operations::Storage},
};

#[derive(Debug, Clone)]
pub struct AudioIngestOptions {
    pub pause: Duration,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AudioIngestReport {
    pub attempted: usize,
    pub updated: usize,
    pub unmatched: usize,
}

/// Fills genre, mood, tempo, album and thumbnail for tracks lacking any of
/// genre, tempo or album.
///
/// Title variants are tried in order until one returns a record, which then
/// replaces all five fields. Tracks without a match stay eligible.
pub fn ingest_audio<A>(
    storage: &Storage,
    source: &A,
    options: &AudioIngestOptions,
) -> Result<AudioIngestReport, StorageError>
where
    A: Connector<Query = str, Record = AudioMetadata> + ?Sized,
{
    let tracks = storage.tracks_missing_audio()?;
    info!("tracks missing audio metadata: {}", tracks.len());

    let mut report = AudioIngestReport::default();
    for track in tracks {
        report.attempted += 1;

        let candidates = audio_title_candidates(&track.key.title);
        match first_found(source, candidates.iter().map(String::as_str)) {
            Fetch::Found(meta) => {
                storage.save_audio_metadata(track.id, &meta)?;
                info!("updated: {}", track.key);
                report.updated += 1;
            }
            Fetch::Transient | Fetch::Missing => {
                info!("no audio metadata: {}", track.key);
                report.unmatched += 1;
            }
        }

        pause(options.pause);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ingest::fakes::FakeSource,
        storage::operations::tests::{add_track, setup_storage},
    };

    fn options() -> AudioIngestOptions {
        AudioIngestOptions {
            pause: Duration::ZERO,
        }
    }

    fn full_record() -> AudioMetadata {
        AudioMetadata {
            genre: Some("Pop".into()),
            mood: Some("Happy".into()),
            tempo: Some(120),
            album: Some("Christmas".into()),
            thumbnail: Some("https://img.test/thumb.jpg".into()),
        }
    }

    #[test]
    fn test_variants_tried_in_order_until_found() -> anyhow::Result<()> {
        let storage = setup_storage()?;
        let track = add_track(&storage, "Brenda Lee", "Rockin' Around The Christmas Tree!");

        let source: FakeSource<str, AudioMetadata> = FakeSource::new()
            .answer("Rockin Around The Christmas Tree", Fetch::Found(full_record()));

        let report = ingest_audio(&storage, &source, &options())?;

        assert_eq!(report.updated, 1);
        assert_eq!(
            source.calls(),
            vec![
                "Rockin' Around The Christmas Tree!".to_string(),
                "Rockin' Around The Christmas Tree".to_string(),
                "Rockin Around The Christmas Tree".to_string(),
            ]
        );
        assert_eq!(storage.audio_metadata(track)?, full_record());

        Ok(())
    }

    #[test]
    fn test_found_record_overwrites_all_fields() -> anyhow::Result<()> {
        let storage = setup_storage()?;
        let track = add_track(&storage, "Mariah Carey", "All I Want For Christmas Is You");
        storage.save_audio_metadata(
            track,
            &AudioMetadata {
                mood: Some("Old mood".into()),
                ..Default::default()
            },
        )?;

        let partial = AudioMetadata {
            genre: Some("Pop".into()),
            tempo: Some(150),
            album: Some("Merry Christmas".into()),
            ..Default::default()
        };
        let source: FakeSource<str, AudioMetadata> = FakeSource::new()
            .answer("All I Want For Christmas Is You", Fetch::Found(partial.clone()));

        ingest_audio(&storage, &source, &options())?;

        assert_eq!(storage.audio_metadata(track)?, partial);
        assert!(storage.tracks_missing_audio()?.is_empty());

        Ok(())
    }

    #[test]
    fn test_unmatched_track_stays_eligible() -> anyhow::Result<()> {
        let storage = setup_storage()?;
        add_track(&storage, "sombr", "12 To 12");
        let source: FakeSource<str, AudioMetadata> = FakeSource::new();

        let report = ingest_audio(&storage, &source, &options())?;

        assert_eq!(report.unmatched, 1);
        assert_eq!(storage.tracks_missing_audio()?.len(), 1);

        Ok(())
    }
}
