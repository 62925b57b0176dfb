use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

use super::fs::{load_json_or_default, write_json_atomic};
use super::Result;
use crate::model::ArtworkId;

/// Ids as found on disk; older files stored them as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredId {
    Number(ArtworkId),
    Text(String),
}

/// Persistent set of artwork ids that have already been published.
///
/// Ids are only ever added. Every `add` is durable before it returns.
#[derive(Debug)]
pub struct UsedArtworks {
    path: PathBuf,
    ids: BTreeSet<ArtworkId>,
}

impl UsedArtworks {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn load(path: PathBuf) -> Result<Self> {
        let stored: Vec<StoredId> = load_json_or_default(&path).await?;
        let mut ids = BTreeSet::new();
        for id in stored {
            match id {
                StoredId::Number(n) => {
                    ids.insert(n);
                }
                StoredId::Text(s) => match s.trim().parse::<ArtworkId>() {
                    Ok(n) => {
                        ids.insert(n);
                    }
                    Err(_) => warn!(value = %s, "ignoring non-numeric used artwork id"),
                },
            }
        }
        debug!(count = ids.len(), "loaded used artworks");
        Ok(Self { path, ids })
    }

    pub fn contains(&self, id: ArtworkId) -> bool {
        self.ids.contains(&id)
    }

    /// Mark `id` as used and persist. Returns whether the id was new.
    pub async fn add(&mut self, id: ArtworkId) -> Result<bool> {
        let inserted = self.ids.insert(id);
        if inserted {
            write_json_atomic(&self.path, &self.ids).await?;
        }
        Ok(inserted)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn starts_empty_on_first_run() {
        let td = tempdir().unwrap();
        let used = UsedArtworks::load(td.path().join("used.json")).await.unwrap();
        assert!(used.is_empty());
        assert!(!used.contains(42));
    }

    #[tokio::test]
    async fn add_is_durable_and_idempotent() {
        let td = tempdir().unwrap();
        let path = td.path().join("used.json");

        let mut used = UsedArtworks::load(path.clone()).await.unwrap();
        assert!(used.add(42).await.unwrap());
        assert!(!used.add(42).await.unwrap());
        assert!(used.add(7).await.unwrap());

        let reloaded = UsedArtworks::load(path).await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains(42));
        assert!(reloaded.contains(7));
    }

    #[tokio::test]
    async fn reads_string_ids_from_older_files() {
        let td = tempdir().unwrap();
        let path = td.path().join("used.json");
        tokio::fs::write(&path, br#"["436535", 11417, "not-an-id"]"#)
            .await
            .unwrap();

        let used = UsedArtworks::load(path).await.unwrap();
        assert_eq!(used.len(), 2);
        assert!(used.contains(436535));
        assert!(used.contains(11417));
    }
}
