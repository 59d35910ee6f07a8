//! Object storage abstraction trait
//!
//! All backends (local filesystem, in-memory) implement this trait, so upload
//! grants, dispatch freshness checks, and the worker download path never couple
//! to a specific backend.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid or expired upload signature: {0}")]
    InvalidSignature(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    BackendError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata of a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Object metadata; `NotFound` for missing keys.
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta>;

    /// Download the full object.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Store an object. Used by the signed PUT route and by tests.
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Generate a signed PUT URL valid for `expires_in`, bound to the key and
    /// the declared content type.
    fn signed_put_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Verify a signed-upload grant presented to the PUT route.
    fn verify_put_grant(&self, key: &str, content_type: &str, token: &str) -> StorageResult<()>;
}
