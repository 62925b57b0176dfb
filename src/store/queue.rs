use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use super::fs::{load_json_or_default, write_json_atomic};
use super::Result;
use crate::model::CandidatePost;

/// Handle to the persisted FIFO of candidate posts.
///
/// The queue is never merged: `save` replaces the whole document, so
/// callers load, mutate and save within one step.
#[derive(Debug, Clone)]
pub struct PostQueue {
    path: PathBuf,
}

impl PostQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<CandidatePost>> {
        let posts: Vec<CandidatePost> = load_json_or_default(&self.path).await?;
        debug!(len = posts.len(), "loaded post queue");
        Ok(posts)
    }

    #[instrument(skip_all, fields(path = %self.path.display(), len = posts.len()))]
    pub async fn save(&self, posts: &[CandidatePost]) -> Result<()> {
        write_json_atomic(&self.path, posts).await
    }
}

/// Split the queue into its head and the remainder.
pub fn pop_head(mut posts: Vec<CandidatePost>) -> Option<(CandidatePost, Vec<CandidatePost>)> {
    if posts.is_empty() {
        return None;
    }
    let head = posts.remove(0);
    Some((head, posts))
}
