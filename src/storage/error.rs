use thiserror::Error;

use crate::domain::track::TrackId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("could not resolve artist '{0}'")]
    ArtistNotResolved(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
