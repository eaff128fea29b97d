//! Song search against a Genius-style API (bearer token, JSON hits)

use log::{info, warn};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{
    config::GeniusConfig,
    domain::track::SearchHit,
    sources::{Connector, Fetch, FetchError, client},
};

pub struct GeniusClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    response: Option<SearchBody>,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    result: HitResult,
}

#[derive(Deserialize)]
struct HitResult {
    id: Option<i64>,
    title: Option<String>,
    artist_names: Option<String>,
    url: Option<String>,
}

impl GeniusClient {
    /// Without a token every lookup is [`Fetch::Missing`]; this is logged once, here.
    pub fn new(
        config: &GeniusConfig,
        user_agent: &str,
        token: Option<String>,
    ) -> anyhow::Result<Self> {
        if token.is_none() {
            warn!(
                "{} is not set, song search is disabled for this run",
                config.token_env
            );
        }
        Ok(Self {
            client: client::build(user_agent, config.timeout_ms)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    fn search(&self, term: &str) -> Result<SearchHit, FetchError> {
        let token = self.token.as_deref().ok_or(FetchError::NoCredential)?;

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .bearer_auth(token)
            .query(&[("q", term)])
            .send()?;
        let body: SearchResponse = client::read_json(client::ensure_ok(response)?)?;

        let first = body
            .response
            .and_then(|r| r.hits.into_iter().next())
            .ok_or(FetchError::Empty)?
            .result;

        Ok(SearchHit {
            id: first.id,
            title: first.title,
            artist_names: first.artist_names,
            url: first.url,
        })
    }
}

impl Connector for GeniusClient {
    type Query = str;
    type Record = SearchHit;

    fn is_active(&self) -> bool {
        self.is_enabled()
    }

    fn lookup(&self, term: &str) -> Fetch<SearchHit> {
        if !self.is_enabled() {
            return Fetch::Missing;
        }
        let result = self.search(term);
        match &result {
            Ok(hit) => info!(
                "search hit for '{term}': {} - {} ({})",
                hit.title.as_deref().unwrap_or("?"),
                hit.artist_names.as_deref().unwrap_or("?"),
                hit.url.as_deref().unwrap_or("no url")
            ),
            Err(e) => info!("no search hit for '{term}': {e}"),
        }
        result.into()
    }
}
