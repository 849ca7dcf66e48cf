//! In-memory object store handler

use super::{validate_bucket, validate_key};
use async_lock::RwLock;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use vigil_core::effects::{ObjectMetadata, ObjectStoreEffects, ObjectStoreError, UserMetadata};

#[derive(Debug, Clone)]
struct StoredObject {
    content: String,
    metadata: UserMetadata,
}

type Buckets = BTreeMap<String, BTreeMap<String, StoredObject>>;

fn not_found(bucket: &str, key: &str) -> ObjectStoreError {
    ObjectStoreError::NotFound {
        bucket: bucket.to_string(),
        key: key.to_string(),
    }
}

/// In-memory object store handler
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStoreHandler {
    buckets: Arc<RwLock<Buckets>>,
}

impl MemoryObjectStoreHandler {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStoreEffects for MemoryObjectStoreHandler {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<String, ObjectStoreError> {
        validate_bucket(bucket)?;
        validate_key(key)?;
        let buckets = self.buckets.read().await;
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.content.clone())
            .ok_or_else(|| not_found(bucket, key))
    }

    async fn write_object_with_metadata(
        &self,
        bucket: &str,
        key: &str,
        content: &str,
        metadata: &UserMetadata,
    ) -> Result<(), ObjectStoreError> {
        validate_bucket(bucket)?;
        validate_key(key)?;
        let mut buckets = self.buckets.write().await;
        buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                content: content.to_string(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<ObjectMetadata, ObjectStoreError> {
        validate_bucket(bucket)?;
        validate_key(key)?;
        let buckets = self.buckets.read().await;
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| ObjectMetadata {
                content_length: object.content.len() as u64,
                user_metadata: object.metadata.clone(),
            })
            .ok_or_else(|| not_found(bucket, key))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<String>, ObjectStoreError> {
        validate_bucket(bucket)?;
        let buckets = self.buckets.read().await;
        let keys = buckets
            .get(bucket)
            .map(|objects| {
                objects
                    .keys()
                    .filter(|k| prefix.map(|p| k.starts_with(p)).unwrap_or(true))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        validate_bucket(bucket)?;
        validate_key(key)?;
        let mut buckets = self.buckets.write().await;
        if let Some(objects) = buckets.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), ObjectStoreError> {
        validate_bucket(bucket)?;
        for key in keys {
            validate_key(key)?;
        }
        let mut buckets = self.buckets.write().await;
        if let Some(objects) = buckets.get_mut(bucket) {
            for key in keys {
                objects.remove(key);
            }
        }
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, ObjectStoreError> {
        validate_bucket(bucket)?;
        validate_key(key)?;
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(bucket)
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_is_key_ordered_and_prefix_filtered() {
        let store = MemoryObjectStoreHandler::new();
        for key in ["b/2", "a/1", "b/1"] {
            store.write_object("bucket", key, key).await.unwrap();
        }

        assert_eq!(
            store.list_objects("bucket", Some("b/")).await.unwrap(),
            vec!["b/1".to_string(), "b/2".to_string()]
        );
        assert!(store.object_exists("bucket", "a/1").await.unwrap());
        assert!(!store.object_exists("other", "a/1").await.unwrap());
    }

    #[tokio::test]
    async fn metadata_follows_writes_and_copies() {
        let store = MemoryObjectStoreHandler::new();
        let metadata = UserMetadata::from([("owner".to_string(), "qa".to_string())]);
        store
            .write_object_with_metadata("src", "report.csv", "a,b\n", &metadata)
            .await
            .unwrap();
        store.copy_object("src", "report.csv", "dst", "report.csv").await.unwrap();

        let head = store.object_metadata("dst", "report.csv").await.unwrap();
        assert_eq!(head.content_length, 4);
        assert_eq!(head.user_metadata, metadata);

        store.write_object("src", "report.csv", "x").await.unwrap();
        let head = store.object_metadata("src", "report.csv").await.unwrap();
        assert!(head.user_metadata.is_empty());
        assert!(store.object_metadata("src", "absent").await.is_err());
    }

    #[tokio::test]
    async fn batch_delete_skips_missing_keys() {
        let store = MemoryObjectStoreHandler::new();
        for key in ["a", "b", "c"] {
            store.write_object("bucket", key, key).await.unwrap();
        }

        let keys = vec!["a".to_string(), "c".to_string(), "zzz".to_string()];
        store.delete_objects("bucket", &keys).await.unwrap();

        assert_eq!(store.list_objects("bucket", None).await.unwrap(), vec!["b".to_string()]);
    }
}
