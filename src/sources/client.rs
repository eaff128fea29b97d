use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use super::FetchError;

/// Blocking client with a fixed per-call timeout
pub fn build(user_agent: &str, timeout_ms: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_millis(timeout_ms))
        .build()
}

/// Rejects anything but 200 OK
pub fn ensure_ok(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(response)
}

/// Reads the body and decodes it as JSON.
///
/// The body is read as text first so that a timeout while reading is still
/// reported as [`FetchError::Timeout`].
pub fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
}
