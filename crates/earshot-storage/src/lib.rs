//! Earshot Storage Library
//!
//! Object storage abstraction: a local filesystem backend with HMAC-signed
//! time-limited upload URLs, and an in-memory backend for tests.

pub mod local;
pub mod memory;
pub mod traits;
pub mod upload_token;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use traits::{ObjectMeta, ObjectStore, StorageError, StorageResult};
