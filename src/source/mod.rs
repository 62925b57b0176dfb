//! Where candidate artworks come from.
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::model::{ArtworkId, ArtworkRecord};
use crate::retry::Transient;

pub mod met;

pub use met::MetClient;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

impl Transient for SourceError {
    fn is_transient(&self) -> bool {
        match self {
            SourceError::Transport(err) => {
                err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
            }
            SourceError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            SourceError::Decode(_) => false,
        }
    }
}

/// Search API over an artwork collection.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Ids matching `term`, at most `limit`. No match is an empty list.
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<ArtworkId>, SourceError>;

    /// Full metadata for `id`, or `None` when the object cannot be posted
    /// (no such object, no image).
    async fn fetch(&self, id: ArtworkId) -> Result<Option<ArtworkRecord>, SourceError>;
}
