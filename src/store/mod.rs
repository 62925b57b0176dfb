//! Durable state for the poster: the used-artwork set, the posting log and
//! the post queue.
//!
//! Each store is a single JSON document under `app.data_dir`, loaded whole
//! and replaced whole through a temp-file-and-rename write:
//! - `used`: artwork ids that have been published (never shrinks).
//! - `log`: append-only audit trail of successful publications.
//! - `queue`: ordered candidates, head is published next.

pub mod fs;
pub mod log;
pub mod queue;
pub mod used;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use log::PostingLog;
pub use queue::{pop_head, PostQueue};
pub use used::UsedArtworks;

pub const USED_FILE: &str = "used_artworks.json";
pub const LOG_FILE: &str = "posted_log.json";
pub const QUEUE_FILE: &str = "generated_posts.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Locations of the three state files inside one data directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    data_dir: PathBuf,
}

impl StateStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn used_path(&self) -> PathBuf {
        self.data_dir.join(USED_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    pub fn queue_path(&self) -> PathBuf {
        self.data_dir.join(QUEUE_FILE)
    }

    pub async fn load_used(&self) -> Result<UsedArtworks> {
        UsedArtworks::load(self.used_path()).await
    }

    pub async fn load_log(&self) -> Result<PostingLog> {
        PostingLog::load(self.log_path()).await
    }

    pub fn queue(&self) -> PostQueue {
        PostQueue::new(self.queue_path())
    }
}
