//! Plain-text summary of the per-artist aggregates.

use std::{fmt::Write as _, fs, path::Path};

use anyhow::Context;

use crate::storage::{operations::Storage, report::ArtistAverage};

pub const CHART_RANK_HEADER: &str = "=== Average Chart Rank Per Artist ===";
pub const LYRICS_LENGTH_HEADER: &str = "=== Average Lyrics Length Per Artist ===";

/// Renders both sections, one `artist: value` line per row, two decimals
pub fn render(chart_rank: &[ArtistAverage], lyrics_length: &[ArtistAverage]) -> String {
    let mut out = String::new();

    section(&mut out, CHART_RANK_HEADER, chart_rank);
    out.push('\n');
    section(&mut out, LYRICS_LENGTH_HEADER, lyrics_length);

    out
}

fn section(out: &mut String, header: &str, rows: &[ArtistAverage]) {
    out.push_str(header);
    out.push('\n');
    for row in rows {
        // writing into a String cannot fail
        let _ = writeln!(out, "{}: {:.2}", row.artist, row.average);
    }
}

/// Queries both aggregates and overwrites `path` with the rendered summary
pub fn write_summary(storage: &Storage, path: &Path) -> anyhow::Result<()> {
    let chart_rank = storage.avg_chart_rank_per_artist(None)?;
    let lyrics_length = storage.avg_lyrics_length_per_artist()?;

    fs::write(path, render(&chart_rank, &lyrics_length))
        .with_context(|| format!("Failed to write summary file {}", path.display()))?;
    log::info!("summary file written to {}", path.display());
    Ok(())
}
