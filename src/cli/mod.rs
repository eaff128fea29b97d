use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::ingest::{
    audio::{AudioIngestOptions, ingest_audio},
    charts::{ChartIngestOptions, run_chart_stage},
    lyrics::{LyricsIngestOptions, ingest_lyrics},
    tracks::{TrackIngestOptions, ingest_tracks},
};
use crate::sources::{
    audiodb::AudioDbClient, chart::ChartClient, genius::GeniusClient, lyrics::LyricsClient,
};
use crate::storage::{db, operations::Storage, report::histogram};
use crate::summary;

#[derive(Parser)]
#[command(name = "chartdex")]
#[command(version = "0.1")]
#[command(about = "Collects chart, lyrics and audio metadata for a song catalog")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database schema if missing
    Init,
    /// Add catalog songs to the database
    Tracks {
        /// Songs file, overrides catalog.seed_file
        #[arg(short, long)]
        songs: Option<PathBuf>,
    },
    /// Record today's chart positions for known tracks
    Charts,
    /// Fetch lyrics for tracks that have none yet
    Lyrics,
    /// Fetch genre, mood, tempo and album for incomplete tracks
    Audio,
    /// Run init, tracks, charts, lyrics and audio in order
    Pipeline,
    /// Write the per-artist summary file
    Summary {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the aggregates
    Stats,
    /// Run http server exposing the aggregates
    Serve,
}

/// Entrypoint for CLI
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = execute(&cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let cfg = Config::load(&cli.config)?;

    match &cli.command {
        Commands::Init => init_stage(&cfg),
        Commands::Tracks { songs } => tracks_stage(&cfg, songs.as_deref()),
        Commands::Charts => charts_stage(&cfg),
        Commands::Lyrics => lyrics_stage(&cfg),
        Commands::Audio => audio_stage(&cfg),
        Commands::Pipeline => {
            pipeline(&cfg);
            Ok(())
        }
        Commands::Summary { out } => {
            let storage = open_storage(&cfg)?;
            let path = out.as_deref().unwrap_or(cfg.report.summary_path.as_path());
            summary::write_summary(&storage, path)?;
            println!("Summary file written to {}", path.display());
            Ok(())
        }
        Commands::Stats => print_stats(&cfg),
        Commands::Serve => {
            let storage = open_storage(&cfg)?;
            let http_server = crate::http::server::HttpServer::new(
                storage,
                cfg.http.clone(),
                cfg.report.histogram_bucket,
            );

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
            Ok(())
        }
    }
}

fn open_storage(cfg: &Config) -> anyhow::Result<Storage> {
    Storage::new(&cfg.database).context("Failed to initialize storage")
}

/// Every stage opens its own connection; a failing stage does not stop the next one
fn pipeline(cfg: &Config) {
    let stages: [(&str, fn(&Config) -> anyhow::Result<()>); 5] = [
        ("init", init_stage),
        ("tracks", |cfg| tracks_stage(cfg, None)),
        ("charts", charts_stage),
        ("lyrics", lyrics_stage),
        ("audio", audio_stage),
    ];

    for (name, stage) in stages {
        info!("=== stage: {name} ===");
        if let Err(e) = stage(cfg) {
            error!("stage {name} failed: {e:#}");
        }
    }
    info!("pipeline finished");
}

fn init_stage(cfg: &Config) -> anyhow::Result<()> {
    let storage = open_storage(cfg)?;
    info!(
        "schema ready: {} tracks, {} artists",
        storage.track_count()?,
        storage.artist_count()?
    );
    Ok(())
}

fn tracks_stage(cfg: &Config, songs: Option<&Path>) -> anyhow::Result<()> {
    let songs_path = songs.unwrap_or(cfg.catalog.seed_file.as_path());
    let songs = config::load_songs(songs_path)?;
    info!("loaded {} songs from {}", songs.len(), songs_path.display());

    let genius = &cfg.sources.genius;
    let search = GeniusClient::new(genius, &cfg.sources.user_agent, genius.token())?;
    if !search.is_enabled() && genius.require_match {
        info!("require_match is set without a search token, nothing will be added");
    }

    let storage = open_storage(cfg)?;
    let options = TrackIngestOptions::new(
        &cfg.batch,
        genius.require_match,
        cfg.sources.lookup_pause(),
    );
    let report = ingest_tracks(&storage, &songs, &search, &options)?;
    println!(
        "Tracks: {} added, {} already present, {} without match, {} total",
        report.inserted, report.already_present, report.unmatched, report.total
    );
    Ok(())
}

fn charts_stage(cfg: &Config) -> anyhow::Result<()> {
    let chart = &cfg.sources.chart;
    let source = ChartClient::new(chart, &cfg.sources.user_agent)?;

    let storage = open_storage(cfg)?;
    let options = ChartIngestOptions {
        chart_name: chart.name.clone(),
        chart_date: db::chart_date(db::today()),
        cap: cfg.batch.chart_limit,
    };
    let report = run_chart_stage(&storage, &source, &chart.url, &options)?;
    println!(
        "Charts: {} parsed, {} inspected, {} added, {} not in catalog",
        report.parsed, report.inspected, report.inserted, report.unmatched
    );
    Ok(())
}

fn lyrics_stage(cfg: &Config) -> anyhow::Result<()> {
    let lyrics = &cfg.sources.lyrics;
    let source = LyricsClient::new(lyrics, &cfg.sources.user_agent)?;

    let storage = open_storage(cfg)?;
    let options = LyricsIngestOptions {
        pause: cfg.sources.lookup_pause(),
        sentinel_on_transient: lyrics.sentinel_on_transient,
    };
    let report = ingest_lyrics(&storage, &source, &options)?;
    println!(
        "Lyrics: {} attempted, {} saved, {} marked missing, {} deferred",
        report.attempted, report.saved, report.marked_missing, report.deferred
    );
    Ok(())
}

fn audio_stage(cfg: &Config) -> anyhow::Result<()> {
    let source = AudioDbClient::new(&cfg.sources.audiodb, &cfg.sources.user_agent)?;

    let storage = open_storage(cfg)?;
    let options = AudioIngestOptions {
        pause: cfg.sources.lookup_pause(),
    };
    let report = ingest_audio(&storage, &source, &options)?;
    println!(
        "Audio: {} attempted, {} updated, {} without match",
        report.attempted, report.updated, report.unmatched
    );
    Ok(())
}

fn print_stats(cfg: &Config) -> anyhow::Result<()> {
    let storage = open_storage(cfg)?;

    println!(
        "Database contains {} tracks by {} artists and {} chart entries",
        storage.track_count()?,
        storage.artist_count()?,
        storage.chart_entry_count()?
    );

    println!();
    print!(
        "{}",
        summary::render(
            &storage.avg_chart_rank_per_artist(None)?,
            &storage.avg_lyrics_length_per_artist()?,
        )
    );

    let points = storage.lyrics_length_vs_rank()?;
    println!();
    println!("=== Lyrics Length vs Chart Rank ({} points) ===", points.len());
    for point in &points {
        println!("  #{}: {} chars", point.chart_position, point.lyric_length);
    }

    println!();
    println!("=== Chart Position Distribution ===");
    for bucket in histogram(&storage.chart_positions()?, cfg.report.histogram_bucket) {
        println!("  {:>3}-{:<3} {}", bucket.start, bucket.end, "#".repeat(bucket.count));
    }

    Ok(())
}
