use log::info;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    config::HttpConfig,
    domain::track::{AudioMetadata, TrackId},
    http::error::ApiError,
    storage::{
        error::StorageError,
        operations::{LyricsState, Storage},
        report::{ArtistAverage, HistogramBucket, LyricsRankPoint, histogram},
    },
};

pub struct HttpServer {
    storage: Arc<Mutex<Storage>>,
    pub config: HttpConfig,
    /// bucket width used when `?bucket=` is absent
    pub default_bucket: u32,
}

impl HttpServer {
    pub fn new(storage: Storage, config: HttpConfig, default_bucket: u32) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            config,
            default_bucket,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let result = rouille::router!(request,
            (GET) (/tracks/{id: TrackId}) => {
                self.track(id)
            },
            (GET) (/stats/artists/chart-rank) => {
                self.chart_rank(request)
            },
            (GET) (/stats/artists/lyrics-length) => {
                self.lyrics_length()
            },
            (GET) (/stats/lyrics-vs-rank) => {
                self.lyrics_vs_rank()
            },
            (GET) (/stats/chart-positions) => {
                self.chart_positions(request)
            },
            _ => Ok(Response::empty_404())
        );

        let response = result.unwrap_or_else(ApiError::into_response);
        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn lock(&self) -> Result<MutexGuard<'_, Storage>, ApiError> {
        self.storage.lock().map_err(|e| {
            ApiError::from(StorageError::Internal(anyhow::anyhow!(
                "Could not access chartdex storage under lock: {e}"
            )))
        })
    }

    fn track(&self, id: TrackId) -> Result<Response, ApiError> {
        let storage = self.lock()?;
        let track = storage.track(id)?;
        let lyrics = storage.lyrics_state(id)?;
        let audio = storage.audio_metadata(id)?;

        Ok(Response::json(&TrackResponse {
            id: track.id,
            artist: track.key.artist,
            title: track.key.title,
            lyrics: LyricsResponse::from_domain(lyrics),
            audio: AudioResponse::from_domain(audio),
        }))
    }

    fn chart_rank(&self, request: &Request) -> Result<Response, ApiError> {
        let limit = parse_param::<usize>(request, "limit")?;
        let rows = self.lock()?.avg_chart_rank_per_artist(limit)?;
        Ok(Response::json(&ArtistAveragesResponse { artists: rows }))
    }

    fn lyrics_length(&self) -> Result<Response, ApiError> {
        let rows = self.lock()?.avg_lyrics_length_per_artist()?;
        Ok(Response::json(&ArtistAveragesResponse { artists: rows }))
    }

    fn lyrics_vs_rank(&self) -> Result<Response, ApiError> {
        let points = self.lock()?.lyrics_length_vs_rank()?;
        Ok(Response::json(&ScatterResponse { points }))
    }

    fn chart_positions(&self, request: &Request) -> Result<Response, ApiError> {
        let bucket = parse_param::<u32>(request, "bucket")?.unwrap_or(self.default_bucket);
        if bucket == 0 {
            return Err(ApiError::BadRequest("bucket must be positive".into()));
        }

        let positions = self.lock()?.chart_positions()?;
        Ok(Response::json(&PositionsResponse {
            buckets: histogram(&positions, bucket),
            positions,
        }))
    }
}

/// `Ok(None)` when the parameter is absent, 400 when it does not parse
fn parse_param<T: std::str::FromStr>(request: &Request, name: &str) -> Result<Option<T>, ApiError> {
    match request.get_param(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("invalid {name}: {raw}"))),
    }
}

#[derive(Serialize, Deserialize)]
struct TrackResponse {
    id: TrackId,
    artist: String,
    title: String,
    lyrics: LyricsResponse,
    audio: AudioResponse,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
enum LyricsResponse {
    NotAttempted,
    Found(String),
    NoLyrics,
}

impl LyricsResponse {
    fn from_domain(state: LyricsState) -> Self {
        match state {
            LyricsState::NotAttempted => Self::NotAttempted,
            LyricsState::Text(text) => Self::Found(text),
            LyricsState::NoLyrics => Self::NoLyrics,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct AudioResponse {
    genre: Option<String>,
    mood: Option<String>,
    tempo: Option<i64>,
    album: Option<String>,
    thumbnail: Option<String>,
}

impl AudioResponse {
    fn from_domain(meta: AudioMetadata) -> Self {
        Self {
            genre: meta.genre,
            mood: meta.mood,
            tempo: meta.tempo,
            album: meta.album,
            thumbnail: meta.thumbnail,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ArtistAveragesResponse {
    artists: Vec<ArtistAverage>,
}

#[derive(Serialize, Deserialize)]
struct ScatterResponse {
    points: Vec<LyricsRankPoint>,
}

#[derive(Serialize, Deserialize)]
struct PositionsResponse {
    positions: Vec<i64>,
    buckets: Vec<HistogramBucket>,
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::operations::tests::{add_track, setup_storage};

    fn create_server(storage: Storage) -> HttpServer {
        HttpServer::new(
            storage,
            HttpConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 8080,
            },
            10,
        )
    }

    fn create_seeded_server() -> anyhow::Result<HttpServer> {
        let storage = setup_storage()?;

        let golden = add_track(&storage, "HUNTR/X", "Golden");
        let opalite = add_track(&storage, "Taylor Swift", "Opalite");
        let ophelia = add_track(&storage, "Taylor Swift", "The Fate Of Ophelia");

        storage.insert_chart_entry(golden, "Billboard Hot 100", 1, "2025-12-06")?;
        storage.insert_chart_entry(opalite, "Billboard Hot 100", 4, "2025-12-06")?;
        storage.insert_chart_entry(ophelia, "Billboard Hot 100", 18, "2025-12-06")?;

        storage.save_lyrics(golden, "Gonna be, gonna be golden")?;
        storage.mark_lyrics_missing(opalite)?;

        Ok(create_server(storage))
    }

    fn get(server: &HttpServer, url: &str) -> Response {
        server.handle_request(&Request::fake_http("GET", url, vec![], vec![]))
    }

    #[test]
    fn test_http_chart_rank() -> anyhow::Result<()> {
        let server = create_seeded_server()?;

        let response = get(&server, "/stats/artists/chart-rank");
        assert_eq!(response.status_code, 200);

        let body: ArtistAveragesResponse = parse_json_response(response)?;
        assert_eq!(body.artists.len(), 2);
        assert_eq!(body.artists[0].artist, "HUNTR/X");
        assert_eq!(body.artists[1].average, 11.0);

        Ok(())
    }

    #[test]
    fn test_http_chart_rank_limit() -> anyhow::Result<()> {
        let server = create_seeded_server()?;

        let body: ArtistAveragesResponse =
            parse_json_response(get(&server, "/stats/artists/chart-rank?limit=1"))?;
        assert_eq!(body.artists.len(), 1);

        let response = get(&server, "/stats/artists/chart-rank?limit=many");
        assert_eq!(response.status_code, 400);

        Ok(())
    }

    #[test]
    fn test_http_lyrics_length_and_scatter() -> anyhow::Result<()> {
        let server = create_seeded_server()?;

        let body: ArtistAveragesResponse =
            parse_json_response(get(&server, "/stats/artists/lyrics-length"))?;
        assert_eq!(body.artists.len(), 1);
        assert_eq!(body.artists[0].average, 25.0);

        let body: ScatterResponse = parse_json_response(get(&server, "/stats/lyrics-vs-rank"))?;
        assert_eq!(
            body.points,
            vec![LyricsRankPoint {
                lyric_length: 25,
                chart_position: 1
            }]
        );

        Ok(())
    }

    #[test]
    fn test_http_chart_positions_histogram() -> anyhow::Result<()> {
        let server = create_seeded_server()?;

        let body: PositionsResponse =
            parse_json_response(get(&server, "/stats/chart-positions"))?;
        assert_eq!(body.positions, vec![1, 4, 18]);
        assert_eq!(body.buckets.len(), 2);
        assert_eq!(body.buckets[0].count, 2);

        let body: PositionsResponse =
            parse_json_response(get(&server, "/stats/chart-positions?bucket=5"))?;
        assert_eq!(body.buckets.len(), 4);

        assert_eq!(get(&server, "/stats/chart-positions?bucket=0").status_code, 400);

        Ok(())
    }

    #[test]
    fn test_http_empty_database() -> anyhow::Result<()> {
        let server = create_server(setup_storage()?);

        let body: PositionsResponse =
            parse_json_response(get(&server, "/stats/chart-positions"))?;
        assert!(body.positions.is_empty());
        assert!(body.buckets.is_empty());

        Ok(())
    }

    #[test]
    fn test_http_get_track() -> anyhow::Result<()> {
        let server = create_seeded_server()?;

        let response = get(&server, "/tracks/1");
        assert_eq!(response.status_code, 200);

        let body: TrackResponse = parse_json_response(response)?;
        assert_eq!(body.artist, "HUNTR/X");
        assert_eq!(body.title, "Golden");
        assert_eq!(
            body.lyrics,
            LyricsResponse::Found("Gonna be, gonna be golden".to_string())
        );
        assert_eq!(body.audio.genre, None);

        let body: TrackResponse = parse_json_response(get(&server, "/tracks/2"))?;
        assert_eq!(body.lyrics, LyricsResponse::NoLyrics);

        let body: TrackResponse = parse_json_response(get(&server, "/tracks/3"))?;
        assert_eq!(body.lyrics, LyricsResponse::NotAttempted);

        Ok(())
    }

    #[test]
    fn test_http_get_track_not_found() -> anyhow::Result<()> {
        let server = create_seeded_server()?;
        assert_eq!(get(&server, "/tracks/999").status_code, 404);
        Ok(())
    }

    #[test]
    fn test_http_unknown_route() -> anyhow::Result<()> {
        let server = create_server(setup_storage()?);
        assert_eq!(get(&server, "/tracks/not-a-number").status_code, 404);
        assert_eq!(get(&server, "/library").status_code, 404);
        Ok(())
    }
}
