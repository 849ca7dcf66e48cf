//! In-memory key-value table handler
//!
//! Tables are created on first write. Items are addressed by the canonical
//! JSON rendering of their key attribute, so `{"S":"1"}` and `{"N":"1"}` are
//! distinct keys.

use async_lock::RwLock;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use vigil_core::effects::{KeyValueEffects, KeyValueError};
use vigil_core::{AttributeWire, WireItem};

type Table = BTreeMap<String, WireItem>;

/// In-memory key-value table store
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueHandler {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl MemoryKeyValueHandler {
    /// Create a store with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table up front so reads before the first write succeed
    pub async fn create_table(&self, table: &str) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default();
    }
}

fn key_of(value: &AttributeWire) -> String {
    value.to_json().to_string()
}

fn table_not_found(table: &str) -> KeyValueError {
    KeyValueError::TableNotFound(table.to_string())
}

#[async_trait]
impl KeyValueEffects for MemoryKeyValueHandler {
    async fn get_item(
        &self,
        table: &str,
        _key_name: &str,
        key_value: &AttributeWire,
    ) -> Result<Option<WireItem>, KeyValueError> {
        let tables = self.tables.read().await;
        let items = tables.get(table).ok_or_else(|| table_not_found(table))?;
        Ok(items.get(&key_of(key_value)).cloned())
    }

    async fn put_item(
        &self,
        table: &str,
        key_name: &str,
        item: WireItem,
    ) -> Result<(), KeyValueError> {
        let key = item
            .get(key_name)
            .map(key_of)
            .ok_or_else(|| KeyValueError::MissingKey(key_name.to_string()))?;
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().insert(key, item);
        Ok(())
    }

    async fn delete_item(
        &self,
        table: &str,
        _key_name: &str,
        key_value: &AttributeWire,
    ) -> Result<bool, KeyValueError> {
        let mut tables = self.tables.write().await;
        let items = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        Ok(items.remove(&key_of(key_value)).is_some())
    }

    async fn query(
        &self,
        table: &str,
        attribute: &str,
        value: &AttributeWire,
    ) -> Result<Vec<WireItem>, KeyValueError> {
        let tables = self.tables.read().await;
        let items = tables.get(table).ok_or_else(|| table_not_found(table))?;
        Ok(items
            .values()
            .filter(|item| item.get(attribute) == Some(value))
            .cloned()
            .collect())
    }

    async fn scan(&self, table: &str) -> Result<Vec<WireItem>, KeyValueError> {
        let tables = self.tables.read().await;
        let items = tables.get(table).ok_or_else(|| table_not_found(table))?;
        Ok(items.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn item(id: &str, status: &str) -> WireItem {
        WireItem::from([
            ("id".to_string(), AttributeWire::S(id.to_string())),
            ("status".to_string(), AttributeWire::S(status.to_string())),
        ])
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryKeyValueHandler::new();
        let key = AttributeWire::S("order-1".to_string());

        store.put_item("orders", "id", item("order-1", "open")).await.unwrap();
        assert_eq!(
            store.get_item("orders", "id", &key).await.unwrap(),
            Some(item("order-1", "open"))
        );

        assert!(store.delete_item("orders", "id", &key).await.unwrap());
        assert!(!store.delete_item("orders", "id", &key).await.unwrap());
        assert_eq!(store.get_item("orders", "id", &key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn query_filters_on_attribute() {
        let store = MemoryKeyValueHandler::new();
        store.put_item("orders", "id", item("1", "open")).await.unwrap();
        store.put_item("orders", "id", item("2", "closed")).await.unwrap();
        store.put_item("orders", "id", item("3", "open")).await.unwrap();

        let open = store
            .query("orders", "status", &AttributeWire::S("open".to_string()))
            .await
            .unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(store.scan("orders").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn errors_for_missing_table_and_key() {
        let store = MemoryKeyValueHandler::new();
        assert_matches!(store.scan("absent").await, Err(KeyValueError::TableNotFound(_)));
        assert_matches!(
            store.put_item("orders", "pk", item("1", "open")).await,
            Err(KeyValueError::MissingKey(_))
        );

        store.create_table("empty").await;
        assert!(store.scan("empty").await.unwrap().is_empty());
    }
}
