use anyhow::Context;
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::domain::track::SongKey;

const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub database: Database,
    pub catalog: Catalog,
    pub batch: Batch,
    pub sources: Sources,
    pub report: Report,
    pub http: HttpConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Config> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| "Failed to parse config TOML")?;
        if config.version > CONFIG_VERSION {
            log::warn!(
                "config version {} is newer than supported version {CONFIG_VERSION}",
                config.version
            );
        }
        Ok(config)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Database {
    InMemory,
    File { path: PathBuf },
}

impl Default for Database {
    fn default() -> Self {
        Database::File {
            path: PathBuf::from("music_project.db"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Catalog {
    /// TOML file with `[[songs]]` entries fed to the track ingest
    pub seed_file: PathBuf,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            seed_file: PathBuf::from("songs.toml"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SongList {
    #[serde(default)]
    songs: Vec<SongKey>,
}

/// Reads a `[[songs]]` file, keeping the order of the entries
pub fn load_songs(path: &Path) -> anyhow::Result<Vec<SongKey>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read songs file {}", path.display()))?;
    let list: SongList = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse songs file {}", path.display()))?;
    Ok(list.songs)
}

/// Per-run insertion caps
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Batch {
    pub track_limit: usize,
    pub track_target: usize,
    pub chart_limit: usize,
}

impl Default for Batch {
    fn default() -> Self {
        Self {
            track_limit: 25,
            track_target: 100,
            chart_limit: 25,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Sources {
    pub user_agent: String,
    /// unconditional sleep after every external lookup
    pub lookup_pause_ms: u64,
    pub genius: GeniusConfig,
    pub lyrics: LyricsConfig,
    pub audiodb: AudioDbConfig,
    pub chart: ChartConfig,
}

impl Sources {
    pub fn lookup_pause(&self) -> Duration {
        Duration::from_millis(self.lookup_pause_ms)
    }
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".to_string(),
            lookup_pause_ms: 400,
            genius: Default::default(),
            lyrics: Default::default(),
            audiodb: Default::default(),
            chart: Default::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeniusConfig {
    pub base_url: String,
    /// name of the environment variable holding the bearer token
    pub token_env: String,
    pub timeout_ms: u64,
    /// skip tracks the search API does not know about
    pub require_match: bool,
}

impl GeniusConfig {
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

impl Default for GeniusConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.genius.com".to_string(),
            token_env: "GENIUS_TOKEN".to_string(),
            timeout_ms: 10_000,
            require_match: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LyricsConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry_backoff_ms: u64,
    /// store the "no lyrics" marker even when the last failure was a timeout
    pub sentinel_on_transient: bool,
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.lyrics.ovh/v1".to_string(),
            timeout_ms: 6_000,
            retry_backoff_ms: 1_000,
            sentinel_on_transient: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AudioDbConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for AudioDbConfig {
    fn default() -> Self {
        Self {
            base_url: "https://theaudiodb.com/api/v1/json/2".to_string(),
            timeout_ms: 8_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    pub url: String,
    pub name: String,
    pub timeout_ms: u64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            url: "https://www.billboard.com/charts/hot-100".to_string(),
            name: "Billboard Hot 100".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Report {
    pub summary_path: PathBuf,
    pub histogram_bucket: u32,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            summary_path: PathBuf::from("calculated_results.txt"),
            histogram_bucket: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
