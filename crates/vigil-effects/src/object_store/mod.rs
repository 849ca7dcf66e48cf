//! Object store handlers

mod filesystem;
mod memory;

pub use filesystem::FilesystemObjectStoreHandler;
pub use memory::MemoryObjectStoreHandler;

use vigil_core::effects::ObjectStoreError;

/// Buckets are a single path component and never start with `.`
fn validate_bucket(bucket: &str) -> Result<(), ObjectStoreError> {
    validate_key(bucket)?;
    if bucket.contains('/') {
        return Err(ObjectStoreError::InvalidKey {
            reason: format!("bucket '{bucket}' must not contain '/'"),
        });
    }
    if bucket.starts_with('.') {
        return Err(ObjectStoreError::InvalidKey {
            reason: format!("bucket '{bucket}' must not start with '.'"),
        });
    }
    Ok(())
}

/// Keys may nest with `/` but must stay inside their bucket
fn validate_key(key: &str) -> Result<(), ObjectStoreError> {
    if key.is_empty() {
        return Err(ObjectStoreError::InvalidKey {
            reason: "Key cannot be empty".to_string(),
        });
    }
    if key.starts_with('/') || key.contains('\0') || key.split('/').any(|part| part == "..") {
        return Err(ObjectStoreError::InvalidKey {
            reason: format!("'{key}' contains invalid characters"),
        });
    }
    Ok(())
}
