use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::application::storage::{ObjectStore, StorageError};
use crate::cache::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::object_store::memory";

/// In-process object store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all buckets.
    pub fn len(&self) -> usize {
        rw_read(&self.objects, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        Ok(rw_read(&self.objects, SOURCE, "exists")
            .contains_key(&(bucket.to_string(), key.to_string())))
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Bytes>, StorageError> {
        Ok(rw_read(&self.objects, SOURCE, "get")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError> {
        rw_write(&self.objects, SOURCE, "put").insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }
}
