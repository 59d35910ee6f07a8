//! In-memory object store for tests and single-process deployments.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::traits::{ObjectMeta, ObjectStore, StorageError, StorageResult};
use crate::upload_token;

struct StoredObject {
    data: Bytes,
    created_at: DateTime<Utc>,
}

pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    base_url: String,
    secret: Vec<u8>,
}

impl MemoryObjectStore {
    pub fn new(base_url: String, secret: Vec<u8>) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            base_url,
            secret,
        }
    }

    /// Backdate an object's creation time. Test hook for freshness checks.
    pub fn set_created_at(&self, key: &str, created_at: DateTime<Utc>) {
        let mut objects = self.objects.lock().expect("object map lock");
        if let Some(object) = objects.get_mut(key) {
            object.created_at = created_at;
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().expect("object map lock").contains_key(key))
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let objects = self.objects.lock().expect("object map lock");
        let object = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(ObjectMeta {
            size: object.data.len() as u64,
            created_at: object.created_at,
        })
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let objects = self.objects.lock().expect("object map lock");
        objects
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, _content_type: &str, data: Bytes) -> StorageResult<()> {
        let mut objects = self.objects.lock().expect("object map lock");
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.lock().expect("object map lock").remove(key);
        Ok(())
    }

    fn signed_put_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let token = upload_token::create(key, content_type, expires_in, &self.secret);
        Ok(format!(
            "{}/storage/{}?token={}",
            self.base_url.trim_end_matches('/'),
            key,
            token
        ))
    }

    fn verify_put_grant(&self, key: &str, content_type: &str, token: &str) -> StorageResult<()> {
        upload_token::verify(token, key, content_type, &self.secret)
    }
}
