//! Key-value table effect trait
//!
//! Tables store wire-encoded items ([`WireItem`]); marshalling to and from
//! [`crate::DynamicValue`] is the caller's job and goes through the codec.

use crate::codec::{AttributeWire, WireItem};
use async_trait::async_trait;

/// Key-value table operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyValueError {
    /// The table does not exist and the backend does not create tables lazily
    #[error("Table not found: {0}")]
    TableNotFound(String),
    /// The item is missing the key attribute used for addressing
    #[error("Item is missing key attribute {0}")]
    MissingKey(String),
    /// Backend failure
    #[error("Key-value backend failure: {0}")]
    Backend(String),
}

/// Key-value table capability
#[async_trait]
pub trait KeyValueEffects: Send + Sync {
    /// Fetch the item whose `key_name` attribute equals `key_value`
    async fn get_item(
        &self,
        table: &str,
        key_name: &str,
        key_value: &AttributeWire,
    ) -> Result<Option<WireItem>, KeyValueError>;

    /// Insert or replace an item, addressed by `key_name`
    async fn put_item(
        &self,
        table: &str,
        key_name: &str,
        item: WireItem,
    ) -> Result<(), KeyValueError>;

    /// Delete the item addressed by `key_name`/`key_value`; returns whether it existed
    async fn delete_item(
        &self,
        table: &str,
        key_name: &str,
        key_value: &AttributeWire,
    ) -> Result<bool, KeyValueError>;

    /// All items whose `attribute` equals `value`
    async fn query(
        &self,
        table: &str,
        attribute: &str,
        value: &AttributeWire,
    ) -> Result<Vec<WireItem>, KeyValueError>;

    /// Every item in the table
    async fn scan(&self, table: &str) -> Result<Vec<WireItem>, KeyValueError>;
}
