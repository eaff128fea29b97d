//! Read-only aggregations over the collected data

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::storage::{
    error::StorageError,
    operations::Storage,
    schema::{columns::*, tables::*},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistAverage {
    pub artist: String,
    pub average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsRankPoint {
    pub lyric_length: i64,
    pub chart_position: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// inclusive
    pub start: i64,
    /// inclusive
    pub end: i64,
    pub count: usize,
}

impl Storage {
    /// Average chart position per artist, best (lowest) first
    pub fn avg_chart_rank_per_artist(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ArtistAverage>, StorageError> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.db.prepare(&format!(
            "SELECT {ARTISTS}.{NAME}, AVG({CHART_POPULARITY}.{CHART_POSITION}) AS avg_rank
             FROM {CHART_POPULARITY}
             JOIN {TRACKS} ON {TRACKS}.{ID} = {CHART_POPULARITY}.{TRACK_ID}
             JOIN {ARTISTS} ON {ARTISTS}.{ID} = {TRACKS}.{ARTIST_ID}
             GROUP BY {ARTISTS}.{NAME}
             HAVING avg_rank IS NOT NULL
             ORDER BY avg_rank ASC, {ARTISTS}.{NAME} ASC
             LIMIT ?1"
        ))?;

        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(ArtistAverage {
                    artist: row.get(0)?,
                    average: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Average lyric length (characters) per artist, longest first.
    /// Tracks marked as having no lyrics are ignored.
    pub fn avg_lyrics_length_per_artist(&self) -> Result<Vec<ArtistAverage>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {ARTISTS}.{NAME}, AVG(LENGTH({LYRICS}.{LYRICS_TEXT})) AS avg_len
             FROM {LYRICS}
             JOIN {TRACKS} ON {TRACKS}.{ID} = {LYRICS}.{TRACK_ID}
             JOIN {ARTISTS} ON {ARTISTS}.{ID} = {TRACKS}.{ARTIST_ID}
             WHERE {LYRICS}.{LYRICS_TEXT} IS NOT NULL
             GROUP BY {ARTISTS}.{NAME}
             HAVING avg_len IS NOT NULL
             ORDER BY avg_len DESC, {ARTISTS}.{NAME} ASC"
        ))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ArtistAverage {
                    artist: row.get(0)?,
                    average: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// (lyric length, chart position) for every charted track with lyrics
    pub fn lyrics_length_vs_rank(&self) -> Result<Vec<LyricsRankPoint>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT LENGTH({LYRICS}.{LYRICS_TEXT}), {CHART_POPULARITY}.{CHART_POSITION}
             FROM {LYRICS}
             JOIN {CHART_POPULARITY} ON {CHART_POPULARITY}.{TRACK_ID} = {LYRICS}.{TRACK_ID}
             WHERE {LYRICS}.{LYRICS_TEXT} IS NOT NULL
             ORDER BY {CHART_POPULARITY}.{CHART_POSITION}"
        ))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(LyricsRankPoint {
                    lyric_length: row.get(0)?,
                    chart_position: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn chart_positions(&self) -> Result<Vec<i64>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {CHART_POSITION} FROM {CHART_POPULARITY} ORDER BY {CHART_POSITION}"
        ))?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Buckets of width `bucket` starting at 1: `1..=bucket`, `bucket+1..=2*bucket`, ...
///
/// Only buckets up to the largest value are returned; empty ones in between are kept.
pub fn histogram(values: &[i64], bucket: u32) -> Vec<HistogramBucket> {
    let width = i64::from(bucket.max(1));
    let Some(&max) = values.iter().max() else {
        return Vec::new();
    };

    let bucket_of = |v: i64| ((v.max(1) - 1) / width) as usize;
    let mut buckets: Vec<HistogramBucket> = (0..=bucket_of(max))
        .map(|i| {
            let start = i as i64 * width + 1;
            HistogramBucket {
                start,
                end: start + width - 1,
                count: 0,
            }
        })
        .collect();

    for &v in values {
        buckets[bucket_of(v)].count += 1;
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::operations::tests::{add_track, setup_storage};

    fn seeded() -> anyhow::Result<Storage> {
        let storage = setup_storage()?;

        let golden = add_track(&storage, "HUNTR/X", "Golden");
        let opalite = add_track(&storage, "Taylor Swift", "Opalite");
        let ophelia = add_track(&storage, "Taylor Swift", "The Fate Of Ophelia");
        let mutt = add_track(&storage, "Leon Thomas", "Mutt");

        storage.insert_chart_entry(golden, "Hot 100", 1, "2025-12-06")?;
        storage.insert_chart_entry(opalite, "Hot 100", 4, "2025-12-06")?;
        storage.insert_chart_entry(ophelia, "Hot 100", 12, "2025-12-06")?;
        storage.insert_chart_entry(mutt, "Hot 100", 20, "2025-12-06")?;

        storage.save_lyrics(golden, "0123456789")?;
        storage.save_lyrics(opalite, "0123")?;
        storage.save_lyrics(ophelia, "012345")?;
        storage.mark_lyrics_missing(mutt)?;

        Ok(storage)
    }

    #[test]
    fn test_avg_chart_rank_per_artist() -> anyhow::Result<()> {
        let storage = seeded()?;

        let rows = storage.avg_chart_rank_per_artist(None)?;
        assert_eq!(
            rows,
            vec![
                ArtistAverage {
                    artist: "HUNTR/X".into(),
                    average: 1.0
                },
                ArtistAverage {
                    artist: "Taylor Swift".into(),
                    average: 8.0
                },
                ArtistAverage {
                    artist: "Leon Thomas".into(),
                    average: 20.0
                },
            ]
        );

        assert_eq!(storage.avg_chart_rank_per_artist(Some(1))?.len(), 1);

        Ok(())
    }

    #[test]
    fn test_avg_lyrics_length_skips_marker_rows() -> anyhow::Result<()> {
        let storage = seeded()?;

        let rows = storage.avg_lyrics_length_per_artist()?;
        assert_eq!(
            rows,
            vec![
                ArtistAverage {
                    artist: "HUNTR/X".into(),
                    average: 10.0
                },
                ArtistAverage {
                    artist: "Taylor Swift".into(),
                    average: 5.0
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn test_scatter_and_positions() -> anyhow::Result<()> {
        let storage = seeded()?;

        let points = storage.lyrics_length_vs_rank()?;
        assert_eq!(points.len(), 3);
        assert_eq!(
            points[0],
            LyricsRankPoint {
                lyric_length: 10,
                chart_position: 1
            }
        );

        assert_eq!(storage.chart_positions()?, vec![1, 4, 12, 20]);

        Ok(())
    }

    #[test]
    fn test_histogram_buckets() {
        let buckets = histogram(&[1, 4, 10, 11, 35], 10);
        assert_eq!(
            buckets,
            vec![
                HistogramBucket { start: 1, end: 10, count: 3 },
                HistogramBucket { start: 11, end: 20, count: 1 },
                HistogramBucket { start: 21, end: 30, count: 0 },
                HistogramBucket { start: 31, end: 40, count: 1 },
            ]
        );

        assert!(histogram(&[], 10).is_empty());
        // zero width is treated as one
        assert_eq!(histogram(&[2], 0).len(), 2);
    }
}
