//! Filesystem-backed object store: one directory per bucket, one file per key.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;
use uuid::Uuid;

use crate::application::storage::{ObjectStore, StorageError};

#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `bucket/key` below the root, rejecting absolute paths and parent traversal.
    fn resolve(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let mut resolved = self.root.clone();
        for segment in [bucket, key] {
            let relative = Path::new(segment);
            if segment.is_empty()
                || relative.is_absolute()
                || relative.components().any(|component| {
                    matches!(
                        component,
                        Component::ParentDir | Component::Prefix(_) | Component::RootDir
                    )
                })
            {
                return Err(StorageError::invalid_path(format!("{bucket}/{key}")));
            }
            resolved.push(relative);
        }
        Ok(resolved)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve(bucket, key)?;
        Ok(fs::try_exists(path).await?)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Bytes>, StorageError> {
        let path = self.resolve(bucket, key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    /// Write to a sibling temp file, then rename over the target so readers never observe a
    /// partially written object.
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError> {
        let path = self.resolve(bucket, key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::invalid_path(format!("{bucket}/{key}")))?;
        fs::create_dir_all(parent).await?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StorageError::invalid_path(format!("{bucket}/{key}")))?;
        let temp = parent.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        let mut file = fs::File::create(&temp).await?;
        if let Err(err) = write_all_synced(&mut file, &body).await {
            drop(file);
            let _ = fs::remove_file(&temp).await;
            return Err(StorageError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StorageError::Io(err));
        }

        debug!(path = %path.display(), bytes = body.len(), "Stored object");
        Ok(())
    }
}

async fn write_all_synced(file: &mut fs::File, body: &[u8]) -> Result<(), std::io::Error> {
    file.write_all(body).await?;
    file.flush().await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (FsObjectStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsObjectStore::new(dir.path().join("archive")).expect("store");
        (store, dir)
    }

    #[tokio::test]
    async fn roundtrip_and_overwrite() {
        let (store, _dir) = store();
        let key = "pga/2023/events/k401465.json";

        assert!(!store.exists("events", key).await.expect("exists"));
        assert!(store.get("events", key).await.expect("get").is_none());

        store
            .put("events", key, Bytes::from_static(b"{\"a\":1}"))
            .await
            .expect("put");
        store
            .put("events", key, Bytes::from_static(b"{\"a\":2}"))
            .await
            .expect("overwrite");

        assert!(store.exists("events", key).await.expect("exists"));
        assert_eq!(
            store.get("events", key).await.expect("get"),
            Some(Bytes::from_static(b"{\"a\":2}"))
        );
    }

    #[tokio::test]
    async fn no_temp_files_are_left_behind() {
        let (store, _dir) = store();
        store
            .put("schedules", "pga/2023/schedule.json", Bytes::from_static(b"[]"))
            .await
            .expect("put");

        let parent = store.root().join("schedules/pga/2023");
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&parent).await.expect("read dir");
        while let Some(entry) = entries.next_entry().await.expect("entry") {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["schedule.json".to_string()]);
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let (store, _dir) = store();
        for (bucket, key) in [("events", "../escape.json"), ("..", "x.json"), ("events", "/etc/passwd")] {
            let err = store.exists(bucket, key).await.expect_err("invalid path");
            assert!(matches!(err, StorageError::InvalidPath { .. }), "{bucket}/{key}");
        }
    }
}
