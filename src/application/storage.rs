//! Storage traits describing the tiers of the resolution chain.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::application::archive::ArchiveError;
use crate::domain::ids::ArchiveKey;

/// An upstream document exactly as fetched; only these are cached and archived.
pub type RawPayload = Value;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object path `{path}`")]
    InvalidPath { path: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Object-storage backend holding opaque bytes in named buckets.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError>;

    /// `Ok(None)` when the object is absent.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Bytes>, StorageError>;

    /// Create or overwrite the object.
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError>;
}

/// First tier: process-local, expiring.
#[async_trait]
pub trait PayloadCache: Send + Sync {
    async fn get(&self, key: &ArchiveKey) -> Option<RawPayload>;

    /// `None` deletes the key.
    async fn put(&self, key: &ArchiveKey, payload: Option<RawPayload>);
}

/// Second tier: durable JSON records.
#[async_trait]
pub trait PayloadArchive: Send + Sync {
    async fn exists(&self, key: &ArchiveKey) -> Result<bool, ArchiveError>;

    async fn get(&self, key: &ArchiveKey) -> Result<Option<RawPayload>, ArchiveError>;

    /// Store the payload, returning what was stored.
    async fn put(&self, key: &ArchiveKey, payload: RawPayload) -> Result<RawPayload, ArchiveError>;
}
