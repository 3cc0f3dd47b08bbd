//! Durable JSON archive over an object-storage bucket.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::application::storage::{ObjectStore, PayloadArchive, RawPayload, StorageError};
use crate::domain::ids::ArchiveKey;

pub(crate) const METRIC_ARCHIVE_WRITE_TOTAL: &str = "fairway_archive_write_total";
const OBJECT_SUFFIX: &str = ".json";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive storage failed for `{key}`")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },
    #[error("archived object `{key}` is not valid JSON")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("payload for `{key}` could not be encoded")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One data domain (schedules, events, rankings) of the archive.
///
/// Payloads are stored as compact JSON with object keys in sorted order, so the same payload
/// always produces the same bytes.
#[derive(Clone)]
pub struct Archive {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl Archive {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_key(key: &ArchiveKey) -> String {
        format!("{key}{OBJECT_SUFFIX}")
    }

    fn storage_error(key: &ArchiveKey, source: StorageError) -> ArchiveError {
        ArchiveError::Storage {
            key: key.to_string(),
            source,
        }
    }
}

#[async_trait]
impl PayloadArchive for Archive {
    async fn exists(&self, key: &ArchiveKey) -> Result<bool, ArchiveError> {
        self.store
            .exists(&self.bucket, &Self::object_key(key))
            .await
            .map_err(|source| Self::storage_error(key, source))
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, key: &ArchiveKey) -> Result<Option<RawPayload>, ArchiveError> {
        let Some(body) = self
            .store
            .get(&self.bucket, &Self::object_key(key))
            .await
            .map_err(|source| Self::storage_error(key, source))?
        else {
            return Ok(None);
        };

        let payload = serde_json::from_slice(&body).map_err(|source| ArchiveError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        debug!(bytes = body.len(), "Read archived payload");
        Ok(Some(payload))
    }

    #[instrument(skip(self, payload), fields(bucket = %self.bucket))]
    async fn put(&self, key: &ArchiveKey, payload: RawPayload) -> Result<RawPayload, ArchiveError> {
        let encoded = serde_json::to_vec(&payload).map_err(|source| ArchiveError::Encode {
            key: key.to_string(),
            source,
        })?;
        let bytes = encoded.len();
        self.store
            .put(&self.bucket, &Self::object_key(key), Bytes::from(encoded))
            .await
            .map_err(|source| Self::storage_error(key, source))?;

        counter!(METRIC_ARCHIVE_WRITE_TOTAL, "bucket" => self.bucket.clone()).increment(1);
        debug!(bytes, "Archived payload");
        Ok(payload)
    }
}
