//! Lyrics lookup through a path-templated API (`{base}/{artist}/{title}`)

use std::time::Duration;

use anyhow::Context;
use log::debug;
use reqwest::{Url, blocking::Client};
use serde::Deserialize;

use crate::{
    config::LyricsConfig,
    domain::track::SongKey,
    sources::{Connector, Fetch, FetchError, RetryPolicy, client},
};

pub struct LyricsClient {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct LyricsResponse {
    lyrics: Option<String>,
}

impl LyricsClient {
    pub fn new(config: &LyricsConfig, user_agent: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid lyrics base url {}", config.base_url))?;
        Ok(Self {
            client: client::build(user_agent, config.timeout_ms)?,
            base_url,
            // one retry, timeouts only; bad statuses are final
            retry: RetryPolicy {
                attempts: 2,
                backoff: Duration::from_millis(config.retry_backoff_ms),
            },
        })
    }

    fn url_for(&self, key: &SongKey) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Decode(format!("{} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .push(&key.artist)
            .push(&key.title);
        Ok(url)
    }

    fn fetch(&self, key: &SongKey) -> Result<String, FetchError> {
        let url = self.url_for(key)?;
        self.retry.run(|| {
            let response = self.client.get(url.clone()).send()?;
            let body: LyricsResponse = client::read_json(client::ensure_ok(response)?)?;
            body.lyrics
                .filter(|text| !text.trim().is_empty())
                .ok_or(FetchError::Empty)
        })
    }
}

impl Connector for LyricsClient {
    type Query = SongKey;
    type Record = String;

    fn lookup(&self, key: &SongKey) -> Fetch<String> {
        let result = self.fetch(key);
        if let Err(e) = &result {
            debug!("no lyrics for {key}: {e}");
        }
        result.into()
    }
}
