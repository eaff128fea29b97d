//! Clients for the external services the catalog is built from.
//!
//! Every connector fails closed: network errors, bad statuses, malformed
//! payloads and empty result sets all end up as a [`Fetch`] value, never as
//! an error the caller has to handle.

use std::time::Duration;

use log::debug;
use thiserror::Error;

pub mod audiodb;
pub mod chart;
pub mod client;
pub mod genius;
pub mod lyrics;

/// Outcome of one external lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Found(T),
    /// timed out, possibly after retrying; may succeed on a later run
    Transient,
    /// the source answered and has nothing usable
    Missing,
}

impl<T> Fetch<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Fetch::Found(value) => Some(value),
            Fetch::Transient | Fetch::Missing => None,
        }
    }
}

impl<T> From<Result<T, FetchError>> for Fetch<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => Fetch::Found(value),
            Err(e) if e.is_transient() => Fetch::Transient,
            Err(_) => Fetch::Missing,
        }
    }
}

/// Why a single request produced nothing
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(reqwest::Error),

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("no results")]
    Empty,

    #[error("no credential configured")]
    NoCredential,
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Request(err)
        }
    }
}

/// One external lookup source
pub trait Connector {
    type Query: ?Sized;
    type Record;

    fn lookup(&self, query: &Self::Query) -> Fetch<Self::Record>;

    /// `false` when every lookup would answer `Missing` without a request
    fn is_active(&self) -> bool {
        true
    }
}

/// Tries `candidates` in order and returns the first [`Fetch::Found`].
///
/// When nothing is found the result is [`Fetch::Transient`] if any attempt
/// timed out, [`Fetch::Missing`] otherwise.
pub fn first_found<'a, C, Q>(
    connector: &C,
    candidates: impl IntoIterator<Item = &'a Q>,
) -> Fetch<C::Record>
where
    C: Connector<Query = Q> + ?Sized,
    Q: ?Sized + std::fmt::Debug + 'a,
{
    let mut transient = false;
    for candidate in candidates {
        debug!("trying candidate {candidate:?}");
        match connector.lookup(candidate) {
            Fetch::Found(record) => return Fetch::Found(record),
            Fetch::Transient => transient = true,
            Fetch::Missing => {}
        }
    }
    if transient {
        Fetch::Transient
    } else {
        Fetch::Missing
    }
}

/// Bounded retry on timeouts with a fixed pause between attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn run<T>(&self, mut attempt: impl FnMut() -> Result<T, FetchError>) -> Result<T, FetchError> {
        let mut tries = 0;
        loop {
            tries += 1;
            match attempt() {
                Err(e) if e.is_transient() && tries < self.attempts => {
                    debug!("{e}, retrying in {:?}", self.backoff);
                    std::thread::sleep(self.backoff);
                }
                other => return other,
            }
        }
    }
}
