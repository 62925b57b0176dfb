use std::path::PathBuf;
use tracing::instrument;

use super::fs::{load_json_or_default, write_json_atomic};
use super::Result;
use crate::model::PostingLogEntry;

/// Append-only history of successful publications, oldest first.
#[derive(Debug)]
pub struct PostingLog {
    path: PathBuf,
    entries: Vec<PostingLogEntry>,
}

impl PostingLog {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn load(path: PathBuf) -> Result<Self> {
        let entries = load_json_or_default(&path).await?;
        Ok(Self { path, entries })
    }

    pub async fn append(&mut self, entry: PostingLogEntry) -> Result<()> {
        self.entries.push(entry);
        write_json_atomic(&self.path, &self.entries).await
    }

    pub fn entries(&self) -> &[PostingLogEntry] {
        &self.entries
    }

    /// The `n` most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> &[PostingLogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
