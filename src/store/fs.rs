//! Whole-document JSON load/replace helpers shared by the stores.
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::{Result, StoreError};

/// Serialize `value` and atomically replace `path` with it.
///
/// The document is written and synced to a sibling `.tmp` file first, then
/// renamed over the target. Readers see the old or the new document, never
/// a torn one.
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp = sibling(path, ".tmp");
    let mut file = tokio::fs::File::create(&tmp)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    file.write_all(&bytes)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    file.sync_all().await.map_err(|e| StoreError::io(&tmp, e))?;
    drop(file);

    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    sync_parent(path).await
}

/// Flush the directory entry so the rename itself survives a crash.
#[cfg(unix)]
async fn sync_parent(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let dir = tokio::fs::File::open(parent)
        .await
        .map_err(|e| StoreError::io(parent, e))?;
    dir.sync_all().await.map_err(|e| StoreError::io(parent, e))
}

#[cfg(not(unix))]
async fn sync_parent(_path: &Path) -> Result<()> {
    Ok(())
}

/// Load a JSON document, treating a missing file as the default value.
///
/// A file that exists but does not parse is copied to `<name>.corrupt`
/// and loaded as the default.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(err) => {
            let backup = sibling(path, ".corrupt");
            warn!(
                path = %path.display(),
                backup = %backup.display(),
                %err,
                "corrupt state file; loading as empty"
            );
            if let Err(e) = tokio::fs::write(&backup, &bytes).await {
                warn!(path = %path.display(), err = %e, "failed to keep a copy of corrupt state file");
            }
            Ok(T::default())
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_loads_default() {
        let td = tempdir().unwrap();
        let v: Vec<u32> = load_json_or_default(&td.path().join("nope.json"))
            .await
            .unwrap();
        assert!(v.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_default() {
        let td = tempdir().unwrap();
        let p = td.path().join("broken.json");
        tokio::fs::write(&p, b"[1, 2,").await.unwrap();
        let v: Vec<u32> = load_json_or_default(&p).await.unwrap();
        assert!(v.is_empty());
        let kept = tokio::fs::read(td.path().join("broken.json.corrupt"))
            .await
            .unwrap();
        assert_eq!(kept, b"[1, 2,");
    }

    #[tokio::test]
    async fn write_replaces_and_leaves_no_tmp() {
        let td = tempdir().unwrap();
        let p = td.path().join("nested").join("doc.json");
        write_json_atomic(&p, &vec![1, 2, 3]).await.unwrap();
        write_json_atomic(&p, &vec![4]).await.unwrap();

        let v: Vec<u32> = load_json_or_default(&p).await.unwrap();
        assert_eq!(v, vec![4]);
        assert!(!sibling(&p, ".tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn parent_directory_is_synced_after_rename() {
        let td = tempdir().unwrap();
        let p = td.path().join("doc.json");
        write_json_atomic(&p, &vec![1]).await.unwrap();
        sync_parent(&p).await.unwrap();

        let gone = td.path().join("gone");
        match sync_parent(&gone.join("doc.json")).await {
            Err(StoreError::Io { path, .. }) => assert_eq!(path, gone),
            other => panic!("expected I/O error, got {other:?}"),
        }
    }
}
