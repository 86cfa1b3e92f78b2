//! Filesystem blob store.
//!
//! Keys map directly to relative paths under the base directory
//! (`{base}/{user_id}/{uuid}{ext}`). Writes go to a temp file first and are
//! renamed into place.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use searchive_core::{BlobStore, Error, Result};

/// Blob store rooted at a local directory.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
}

impl FilesystemBlobStore {
    /// Create a new filesystem store with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Resolve `key` below the base directory, rejecting anything that escapes it.
    fn full_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::InvalidInput(format!("invalid storage key '{key}'")));
        }
        Ok(self.base_path.join(relative))
    }

    /// Write, read back, and delete a probe file.
    ///
    /// Run at startup so permission or mount problems surface before the first upload.
    pub async fn validate(&self) -> Result<()> {
        let probe_dir = self.base_path.join(".health-check");
        let probe = probe_dir.join("probe.bin");
        let data = b"blob-store-health-check";

        fs::create_dir_all(&probe_dir).await?;
        fs::write(&probe, data).await?;
        let read_back = fs::read(&probe).await?;
        fs::remove_file(&probe).await?;
        let _ = fs::remove_dir(&probe_dir).await;

        if read_back != data {
            return Err(Error::Storage("read-back mismatch".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let full_path = self.full_path(key)?;
        debug!(
            subsystem = "db",
            component = "blob_fs",
            op = "put",
            storage_key = key,
            size = bytes.len(),
            content_type,
            "Writing blob"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "blob_fs: create_dir_all failed");
                Error::Storage(format!("create directory: {e}"))
            })?;
        }

        let mut temp_name = full_path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Storage(format!("create {}: {e}", temp_path.display())))?;
        file.write_all(bytes)
            .await
            .map_err(|e| Error::Storage(format!("write: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| Error::Storage(format!("sync: {e}")))?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "blob_fs: rename failed");
            Error::Storage(format!("rename: {e}"))
        })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(key)?;
        fs::read(&full_path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(format!("blob '{key}'")),
            _ => Error::Storage(format!("read {key}: {e}")),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.full_path(key)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("delete {key}: {e}"))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_path = self.full_path(key)?;
        fs::try_exists(full_path)
            .await
            .map_err(|e| Error::Storage(format!("stat {key}: {e}")))
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FilesystemBlobStore) {
        let dir = TempDir::new().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let (_dir, store) = store();
        store.put("7/abc.txt", b"hello", "text/plain").await.unwrap();

        assert!(store.exists("7/abc.txt").await.unwrap());
        assert_eq!(store.get("7/abc.txt").await.unwrap(), b"hello");

        store.delete("7/abc.txt").await.unwrap();
        assert!(!store.exists("7/abc.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (_dir, store) = store();
        store.put("1/a.bin", b"one", "application/pdf").await.unwrap();
        store.put("1/a.bin", b"two", "application/pdf").await.unwrap();
        assert_eq!(store.get("1/a.bin").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let (_dir, store) = store();
        store.delete("1/never-written.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.get("1/missing.pdf").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let (_dir, store) = store();
        for key in ["../etc/passwd", "/abs/path", "a/../../b", ""] {
            let err = store.put(key, b"x", "text/plain").await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{key}");
        }
    }

    #[tokio::test]
    async fn test_validate() {
        let (_dir, store) = store();
        store.validate().await.unwrap();
    }
}
