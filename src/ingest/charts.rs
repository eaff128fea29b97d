use log::{info, warn};

use crate::{
    domain::track::ChartEntry,
    sources::Connector,
    storage::{
        error::StorageError,
        operations::{InsertOutcome, Storage},
    },
};

#[derive(Debug, Clone)]
pub struct ChartIngestOptions {
    pub chart_name: String,
    /// `YYYY-MM-DD`
    pub chart_date: String,
    /// most new chart rows a single run may add
    pub cap: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChartIngestReport {
    pub parsed: usize,
    pub inspected: usize,
    pub inserted: usize,
    pub already_present: usize,
    pub unmatched: usize,
}

/// Records chart positions for entries that match a catalog track exactly.
///
/// Entries are inspected in rank order until `cap` new rows were written.
/// Unknown songs are never added to the catalog.
pub fn ingest_chart(
    storage: &Storage,
    entries: &[ChartEntry],
    options: &ChartIngestOptions,
) -> Result<ChartIngestReport, StorageError> {
    let mut report = ChartIngestReport {
        parsed: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        if report.inserted >= options.cap {
            break;
        }
        report.inspected += 1;

        let Some(track_id) = storage.find_track_id(&entry.key)? else {
            info!("#{} not in catalog: {}", entry.rank, entry.key);
            report.unmatched += 1;
            continue;
        };

        match storage.insert_chart_entry(
            track_id,
            &options.chart_name,
            entry.rank,
            &options.chart_date,
        )? {
            InsertOutcome::Inserted(_) => {
                info!("#{} saved: {}", entry.rank, entry.key);
                report.inserted += 1;
            }
            InsertOutcome::AlreadyPresent => report.already_present += 1,
        }
    }

    info!(
        "chart rows added: {} ({} inspected, {} not in catalog)",
        report.inserted, report.inspected, report.unmatched
    );
    Ok(report)
}

/// Fetches the chart page and feeds it to [`ingest_chart`].
///
/// An unreachable or unparseable page is logged and leaves the database
/// untouched.
pub fn run_chart_stage<C>(
    storage: &Storage,
    source: &C,
    url: &str,
    options: &ChartIngestOptions,
) -> Result<ChartIngestReport, StorageError>
where
    C: Connector<Query = str, Record = Vec<ChartEntry>> + ?Sized,
{
    match source.lookup(url).found() {
        Some(entries) => ingest_chart(storage, &entries, options),
        None => {
            warn!("no chart entries fetched from {url}");
            Ok(ChartIngestReport::default())
        }
    }
}
