//! Collaborator capability set
//!
//! Built once at startup and handed to the step interpreter. Scenarios reach
//! collaborators only through these handles.

use crate::error::ScenarioFault;
use std::fmt;
use std::sync::Arc;
use vigil_core::codec::{self, CodecError};
use vigil_core::effects::{
    FunctionEffects, KeyValueEffects, KeyValueError, ObjectStoreEffects, PubSubEffects,
    QueueEffects, RelationalEffects, TimeEffects,
};
use vigil_core::{DynamicMap, DynamicValue};

/// Handles to every collaborator a scenario may use
#[derive(Clone)]
pub struct Capabilities {
    /// Object storage
    pub object_store: Arc<dyn ObjectStoreEffects>,
    /// Key-value tables
    pub key_value: Arc<dyn KeyValueEffects>,
    /// Function invocation
    pub functions: Arc<dyn FunctionEffects>,
    /// Message queues
    pub queues: Arc<dyn QueueEffects>,
    /// Pub-sub topics
    pub pubsub: Arc<dyn PubSubEffects>,
    /// Relational access
    pub relational: Arc<dyn RelationalEffects>,
    /// Clock and sleep
    pub time: Arc<dyn TimeEffects>,
}

impl Capabilities {
    /// Key-value facade for `table`, addressed by the `key_name` attribute
    pub fn table(&self, table: impl Into<String>, key_name: impl Into<String>) -> KeyValueTable {
        KeyValueTable::new(self.key_value.clone(), table, key_name)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}

/// Failures of the key-value facade
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// Marshalling failed
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The table store failed
    #[error(transparent)]
    Store(#[from] KeyValueError),
    /// The item is not a map
    #[error("items must be maps, got {0}")]
    NotAMap(&'static str),
}

impl From<TableError> for ScenarioFault {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Codec(e) => ScenarioFault::Codec(e),
            TableError::Store(e) => e.into(),
            TableError::NotAMap(type_name) => {
                ScenarioFault::assertion(format!("items must be maps, got {type_name}"))
            }
        }
    }
}

/// A key-value table speaking [`DynamicValue`]
///
/// Items are marshalled through the value codec on the way in and out.
#[derive(Clone)]
pub struct KeyValueTable {
    store: Arc<dyn KeyValueEffects>,
    table: String,
    key_name: String,
}

impl KeyValueTable {
    /// Facade over `store` for one table
    pub fn new(
        store: Arc<dyn KeyValueEffects>,
        table: impl Into<String>,
        key_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            key_name: key_name.into(),
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.table
    }

    /// Insert or replace an item; it must contain the key attribute
    pub async fn put(&self, item: &DynamicValue) -> Result<(), TableError> {
        let map = item
            .as_map()
            .ok_or_else(|| TableError::NotAMap(item.type_name()))?;
        let wire = codec::encode_item(map)?;
        self.store.put_item(&self.table, &self.key_name, wire).await?;
        Ok(())
    }

    /// Fetch the item with key `key`
    pub async fn get(&self, key: &DynamicValue) -> Result<Option<DynamicMap>, TableError> {
        let key = codec::encode(key)?;
        let item = self.store.get_item(&self.table, &self.key_name, &key).await?;
        Ok(item.as_ref().map(codec::decode_item).transpose()?)
    }

    /// Delete the item with key `key`; returns whether it existed
    pub async fn delete(&self, key: &DynamicValue) -> Result<bool, TableError> {
        let key = codec::encode(key)?;
        Ok(self.store.delete_item(&self.table, &self.key_name, &key).await?)
    }

    /// Items whose `attribute` equals `value`
    pub async fn query(
        &self,
        attribute: &str,
        value: &DynamicValue,
    ) -> Result<Vec<DynamicMap>, TableError> {
        let value = codec::encode(value)?;
        let items = self.store.query(&self.table, attribute, &value).await?;
        Ok(items
            .iter()
            .map(codec::decode_item)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Every item in the table
    pub async fn scan(&self) -> Result<Vec<DynamicMap>, TableError> {
        let items = self.store.scan(&self.table).await?;
        Ok(items
            .iter()
            .map(codec::decode_item)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl fmt::Debug for KeyValueTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValueTable")
            .field("table", &self.table)
            .field("key_name", &self.key_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use vigil_effects::MemoryKeyValueHandler;

    fn orders() -> KeyValueTable {
        KeyValueTable::new(Arc::new(MemoryKeyValueHandler::new()), "dev-orders", "id")
    }

    #[tokio::test]
    async fn round_trips_dynamic_items() {
        let table = orders();
        let item = DynamicValue::from(json!({
            "id": "o-1",
            "total": 12.5,
            "paid": false,
            "note": null,
            "lines": [{"sku": "a", "qty": 2}]
        }));

        table.put(&item).await.unwrap();
        let fetched = table.get(&DynamicValue::from("o-1")).await.unwrap();

        assert_eq!(fetched.map(DynamicValue::Map), Some(item));
    }

    #[tokio::test]
    async fn query_and_delete() {
        let table = orders();
        for (id, status) in [("1", "open"), ("2", "closed"), ("3", "open")] {
            table
                .put(&DynamicValue::from(json!({"id": id, "status": status})))
                .await
                .unwrap();
        }

        let open = table.query("status", &DynamicValue::from("open")).await.unwrap();
        assert_eq!(open.len(), 2);

        assert!(table.delete(&DynamicValue::from("1")).await.unwrap());
        assert_eq!(table.scan().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rejects_non_map_and_unencodable_items() {
        let table = orders();
        assert_matches!(
            table.put(&DynamicValue::from("not a map")).await,
            Err(TableError::NotAMap("string"))
        );
        assert_matches!(
            table.put(&DynamicValue::from(json!({"id": "x"}))).await,
            Ok(())
        );
        assert_matches!(
            table.get(&DynamicValue::Number(f64::NAN)).await,
            Err(TableError::Codec(CodecError::UnsupportedType { .. }))
        );
    }
}
