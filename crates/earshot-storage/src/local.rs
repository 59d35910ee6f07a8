//! Local filesystem object store with HMAC-signed upload URLs.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::traits::{ObjectMeta, ObjectStore, StorageError, StorageResult};
use crate::upload_token;

/// Object store backed by a local directory. Signed PUT URLs point at the
/// service's own `/storage/{key}` route and carry a self-contained HMAC grant.
#[derive(Clone)]
pub struct LocalObjectStore {
    base_path: PathBuf,
    base_url: String,
    secret: Vec<u8>,
}

impl LocalObjectStore {
    /// # Arguments
    /// * `base_path` - root directory for stored objects
    /// * `base_url` - base URL of the service serving the PUT route
    /// * `secret` - HMAC secret for upload grants
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        secret: Vec<u8>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalObjectStore {
            base_path,
            base_url,
            secret,
        })
    }

    /// Convert an object key to a filesystem path, rejecting traversal.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty()
            || key.contains("..")
            || key.starts_with('/')
            || key.contains('\\')
            || key.contains('\0')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let path = self.key_to_path(key)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|_| StorageError::NotFound(key.to_string()))?;

        // mtime stands in for creation time: objects are written once
        let created_at: DateTime<Utc> = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(ObjectMeta {
            size: metadata.len(),
            created_at,
        })
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, _content_type: &str, data: Bytes) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn signed_put_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(key)?;
        let token = upload_token::create(key, content_type, expires_in, &self.secret);
        let encoded_key = utf8_percent_encode(key, NON_ALPHANUMERIC).to_string();
        Ok(format!(
            "{}/storage/{}?token={}",
            self.base_url.trim_end_matches('/'),
            encoded_key,
            token
        ))
    }

    fn verify_put_grant(&self, key: &str, content_type: &str, token: &str) -> StorageResult<()> {
        upload_token::verify(token, key, content_type, &self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    async fn store() -> (tempfile::TempDir, LocalObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(
            dir.path(),
            "http://localhost:4000".to_string(),
            SECRET.to_vec(),
        )
        .await
        .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_get_head_delete_round_trip() {
        let (_dir, store) = store().await;
        store
            .put("123-a.mp3", "audio/mpeg", Bytes::from_static(b"ID3data"))
            .await
            .unwrap();

        assert!(store.exists("123-a.mp3").await.unwrap());
        let meta = store.head("123-a.mp3").await.unwrap();
        assert_eq!(meta.size, 7);

        let data = store.get("123-a.mp3").await.unwrap();
        assert_eq!(&data[..], b"ID3data");

        store.delete("123-a.mp3").await.unwrap();
        assert!(!store.exists("123-a.mp3").await.unwrap());
        assert!(matches!(
            store.get("123-a.mp3").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let (_dir, store) = store().await;
        assert!(matches!(
            store.get("../etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.get("/abs/path").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn signed_url_grant_verifies() {
        let (_dir, store) = store().await;
        let url = store
            .signed_put_url("123-a.mp3", "audio/mpeg", Duration::from_secs(10))
            .unwrap();
        let token = url.split("token=").nth(1).unwrap();
        assert!(store.verify_put_grant("123-a.mp3", "audio/mpeg", token).is_ok());
        assert!(store.verify_put_grant("123-a.mp3", "audio/wav", token).is_err());
    }
}
