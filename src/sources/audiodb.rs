//! Track metadata search (`searchtrack.php?t=...`, results under `track`)

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::AudioDbConfig,
    domain::track::AudioMetadata,
    sources::{Connector, Fetch, FetchError, client},
};

pub struct AudioDbClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    track: Option<Vec<TrackInfo>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackInfo {
    str_genre: Option<String>,
    str_mood: Option<String>,
    /// string in practice, number in some dumps
    int_tempo: Option<Value>,
    str_album: Option<String>,
    str_track_thumb: Option<String>,
}

impl From<TrackInfo> for AudioMetadata {
    fn from(info: TrackInfo) -> Self {
        Self {
            genre: info.str_genre,
            mood: info.str_mood,
            tempo: info.int_tempo.as_ref().and_then(tempo_from_json),
            album: info.str_album,
            thumbnail: info.str_track_thumb,
        }
    }
}

fn tempo_from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}

impl AudioDbClient {
    pub fn new(config: &AudioDbConfig, user_agent: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: client::build(user_agent, config.timeout_ms)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search(&self, track_name: &str) -> Result<AudioMetadata, FetchError> {
        let response = self
            .client
            .get(format!("{}/searchtrack.php", self.base_url))
            .query(&[("t", track_name)])
            .send()?;
        let body: SearchResponse = client::read_json(client::ensure_ok(response)?)?;

        body.track
            .and_then(|tracks| tracks.into_iter().next())
            .map(AudioMetadata::from)
            .ok_or(FetchError::Empty)
    }
}

impl Connector for AudioDbClient {
    type Query = str;
    type Record = AudioMetadata;

    fn lookup(&self, track_name: &str) -> Fetch<AudioMetadata> {
        let result = self.search(track_name);
        if let Err(e) = &result {
            debug!("no audio metadata for '{track_name}': {e}");
        }
        result.into()
    }
}
