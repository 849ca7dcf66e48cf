//! Object store effect trait
//!
//! Bucket + key addressed blobs with string content, the shape scenarios use
//! to stage and verify files.

use async_trait::async_trait;
use std::collections::BTreeMap;

/// User-supplied string metadata attached to an object
pub type UserMetadata = BTreeMap<String, String>;

/// Head view of a stored object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Content size in bytes
    pub content_length: u64,
    /// Metadata supplied when the object was written
    pub user_metadata: UserMetadata,
}

/// Object store operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectStoreError {
    /// The bucket/key pair does not exist
    #[error("Object not found: {bucket}/{key}")]
    NotFound {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },
    /// The key is empty or otherwise unusable
    #[error("Invalid object key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },
    /// Backend read/write failure
    #[error("Object store backend failure: {0}")]
    Backend(String),
}

/// Object store capability
#[async_trait]
pub trait ObjectStoreEffects: Send + Sync {
    /// Read an object's content
    async fn read_object(&self, bucket: &str, key: &str) -> Result<String, ObjectStoreError>;

    /// Create or overwrite an object without user metadata
    async fn write_object(
        &self,
        bucket: &str,
        key: &str,
        content: &str,
    ) -> Result<(), ObjectStoreError> {
        self.write_object_with_metadata(bucket, key, content, &UserMetadata::new())
            .await
    }

    /// Create or overwrite an object, replacing any previous metadata
    async fn write_object_with_metadata(
        &self,
        bucket: &str,
        key: &str,
        content: &str,
        metadata: &UserMetadata,
    ) -> Result<(), ObjectStoreError>;

    /// Size and user metadata of an existing object
    async fn object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<ObjectMetadata, ObjectStoreError>;

    /// List keys in a bucket, optionally restricted to a prefix, in key order
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<String>, ObjectStoreError>;

    /// Delete an object; deleting a missing object is not an error
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError>;

    /// Delete several objects in one call; missing keys are skipped
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), ObjectStoreError> {
        for key in keys {
            self.delete_object(bucket, key).await?;
        }
        Ok(())
    }

    /// Whether an object exists
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, ObjectStoreError>;

    /// Copy an object and its metadata between buckets
    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<(), ObjectStoreError> {
        let content = self.read_object(source_bucket, source_key).await?;
        let metadata = self.object_metadata(source_bucket, source_key).await?;
        self.write_object_with_metadata(dest_bucket, dest_key, &content, &metadata.user_metadata)
            .await
    }
}
