//! Filesystem object store handler
//!
//! Objects live at `<base>/<bucket>/<key>`; keys containing `/` become
//! nested directories. User metadata is kept as JSON at
//! `<base>/.metadata/<bucket>/<key>.json`, which bucket validation keeps out
//! of the bucket namespace.

use super::{validate_bucket, validate_key};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use vigil_core::effects::{ObjectMetadata, ObjectStoreEffects, ObjectStoreError, UserMetadata};

const METADATA_DIR: &str = ".metadata";

/// Filesystem-based object store handler
#[derive(Debug, Clone)]
pub struct FilesystemObjectStoreHandler {
    base_path: PathBuf,
}

impl FilesystemObjectStoreHandler {
    /// Create a handler rooted at `base_path`; directories are created lazily
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Root directory of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, ObjectStoreError> {
        validate_bucket(bucket)?;
        validate_key(key)?;
        Ok(self.base_path.join(bucket).join(key))
    }

    fn metadata_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.base_path
            .join(METADATA_DIR)
            .join(bucket)
            .join(format!("{key}.json"))
    }

    async fn read_user_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<UserMetadata, ObjectStoreError> {
        let path = self.metadata_path(bucket, key);
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ObjectStoreError::Backend(format!("Corrupt metadata for {bucket}/{key}: {e}"))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UserMetadata::new()),
            Err(e) => Err(backend("read metadata", e)),
        }
    }

    async fn write_user_metadata(
        &self,
        bucket: &str,
        key: &str,
        metadata: &UserMetadata,
    ) -> Result<(), ObjectStoreError> {
        let path = self.metadata_path(bucket, key);
        if metadata.is_empty() {
            return remove_if_present(&path, "delete metadata").await;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| backend("create directory", e))?;
        }
        let bytes = serde_json::to_vec(metadata)
            .map_err(|e| ObjectStoreError::Backend(format!("Failed to encode metadata: {e}")))?;
        fs::write(&path, bytes)
            .await
            .map_err(|e| backend("write metadata", e))
    }
}

async fn remove_if_present(path: &Path, action: &str) -> Result<(), ObjectStoreError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(backend(action, e)),
    }
}

fn backend(action: &str, e: std::io::Error) -> ObjectStoreError {
    ObjectStoreError::Backend(format!("Failed to {action}: {e}"))
}

#[async_trait]
impl ObjectStoreEffects for FilesystemObjectStoreHandler {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<String, ObjectStoreError> {
        let path = self.object_path(bucket, key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(backend("read object", e)),
        }
    }

    async fn write_object_with_metadata(
        &self,
        bucket: &str,
        key: &str,
        content: &str,
        metadata: &UserMetadata,
    ) -> Result<(), ObjectStoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| backend("create directory", e))?;
        }
        fs::write(&path, content)
            .await
            .map_err(|e| backend("write object", e))?;
        self.write_user_metadata(bucket, key, metadata).await?;
        debug!(bucket, key, bytes = content.len(), "object written");
        Ok(())
    }

    async fn object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<ObjectMetadata, ObjectStoreError> {
        let path = self.object_path(bucket, key)?;
        let content_length = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => {
                return Err(ObjectStoreError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ObjectStoreError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(backend("stat object", e)),
        };
        Ok(ObjectMetadata {
            content_length,
            user_metadata: self.read_user_metadata(bucket, key).await?,
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<String>, ObjectStoreError> {
        validate_bucket(bucket)?;
        let bucket_root = self.base_path.join(bucket);
        let mut keys = Vec::new();
        let mut stack: Vec<PathBuf> = vec![bucket_root.clone()];

        while let Some(dir) = stack.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(backend("read directory", e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| backend("read directory entry", e))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| backend("read file type", e))?;
                if file_type.is_dir() {
                    stack.push(entry.path());
                    continue;
                }

                let path = entry.path();
                let Ok(relative) = path.strip_prefix(&bucket_root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if prefix.map(|p| key.starts_with(p)).unwrap_or(true) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(bucket, key)?;
        remove_if_present(&path, "delete object").await?;
        remove_if_present(&self.metadata_path(bucket, key), "delete metadata").await
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, ObjectStoreError> {
        let path = self.object_path(bucket, key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(backend("stat object", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn write_read_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStoreHandler::new(dir.path());

        store.write_object("fixtures", "a.txt", "alpha").await.unwrap();
        store
            .write_object("fixtures", "nested/b.txt", "beta")
            .await
            .unwrap();

        assert_eq!(store.read_object("fixtures", "a.txt").await.unwrap(), "alpha");
        assert_eq!(
            store.list_objects("fixtures", None).await.unwrap(),
            vec!["a.txt".to_string(), "nested/b.txt".to_string()]
        );
        assert_eq!(
            store.list_objects("fixtures", Some("nested/")).await.unwrap(),
            vec!["nested/b.txt".to_string()]
        );

        store.delete_object("fixtures", "a.txt").await.unwrap();
        assert!(!store.object_exists("fixtures", "a.txt").await.unwrap());
        store.delete_object("fixtures", "a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStoreHandler::new(dir.path());

        assert_matches!(
            store.read_object("fixtures", "absent").await,
            Err(ObjectStoreError::NotFound { .. })
        );
        assert!(store.list_objects("empty", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn copy_between_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStoreHandler::new(dir.path());

        store.write_object("src", "k", "payload").await.unwrap();
        store.copy_object("src", "k", "dst", "copied/k").await.unwrap();

        assert_eq!(store.read_object("dst", "copied/k").await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn metadata_is_stored_beside_the_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStoreHandler::new(dir.path());
        let metadata = UserMetadata::from([("content-kind".to_string(), "csv".to_string())]);

        store
            .write_object_with_metadata("fixtures", "nested/data.csv", "1,2,3", &metadata)
            .await
            .unwrap();
        let head = store.object_metadata("fixtures", "nested/data.csv").await.unwrap();
        assert_eq!(head.content_length, 5);
        assert_eq!(head.user_metadata, metadata);
        assert_eq!(
            store.list_objects("fixtures", None).await.unwrap(),
            vec!["nested/data.csv".to_string()]
        );

        store
            .delete_objects("fixtures", &["nested/data.csv".to_string(), "absent".to_string()])
            .await
            .unwrap();
        assert_matches!(
            store.object_metadata("fixtures", "nested/data.csv").await,
            Err(ObjectStoreError::NotFound { .. })
        );
        assert!(!store.metadata_path("fixtures", "nested/data.csv").exists());
    }
}
