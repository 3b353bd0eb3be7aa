use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{validate_key, BlobStore, StorageError};
use crate::config::StorageConfig;

/// Blob store backed by a directory, served publicly under `public_base_url`
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.root_path, &config.public_base_url)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write then rename so readers never see a partial file
        let tmp = path.with_extension("part");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!("Stored {} bytes at {}", bytes.len(), key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost:3000/storage/");

        store.put("avatars/u1/abc.png", b"image-bytes").await.unwrap();
        let on_disk = std::fs::read(dir.path().join("avatars").join("u1").join("abc.png")).unwrap();
        assert_eq!(on_disk, b"image-bytes");
        assert!(!dir.path().join("avatars/u1/abc.part").exists());

        assert_eq!(
            store.public_url("avatars/u1/abc.png"),
            "http://localhost:3000/storage/avatars/u1/abc.png"
        );

        assert!(store.delete("avatars/u1/abc.png").await.unwrap());
        assert!(!store.delete("avatars/u1/abc.png").await.unwrap());
    }

    #[tokio::test]
    async fn refuses_keys_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://x");
        assert!(matches!(
            store.put("../escape.png", b"x").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
