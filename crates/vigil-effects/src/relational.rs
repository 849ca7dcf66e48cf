//! Relational statement registry handler
//!
//! There is no SQL engine in process. Statements are registered with the
//! closure that answers them; whitespace is normalised before lookup and
//! anything unregistered is an [`RelationalError::UnsupportedStatement`].

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use vigil_core::effects::{RelationalEffects, RelationalError, Row};
use vigil_core::DynamicValue;

type QueryHandler = Arc<dyn Fn(&[DynamicValue]) -> Result<Vec<Row>, RelationalError> + Send + Sync>;
type UpdateHandler = Arc<dyn Fn(&[DynamicValue]) -> Result<u64, RelationalError> + Send + Sync>;

/// Relational handler answering registered statements
#[derive(Clone, Default)]
pub struct StatementRegistryHandler {
    queries: Arc<RwLock<HashMap<String, QueryHandler>>>,
    updates: Arc<RwLock<HashMap<String, UpdateHandler>>>,
}

fn normalize(statement: &str) -> String {
    statement.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl StatementRegistryHandler {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for a query statement
    pub fn register_query<F>(&self, statement: &str, handler: F)
    where
        F: Fn(&[DynamicValue]) -> Result<Vec<Row>, RelationalError> + Send + Sync + 'static,
    {
        self.queries
            .write()
            .insert(normalize(statement), Arc::new(handler));
    }

    /// Register the handler for an update statement
    pub fn register_update<F>(&self, statement: &str, handler: F)
    where
        F: Fn(&[DynamicValue]) -> Result<u64, RelationalError> + Send + Sync + 'static,
    {
        self.updates
            .write()
            .insert(normalize(statement), Arc::new(handler));
    }
}

impl fmt::Debug for StatementRegistryHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementRegistryHandler")
            .field("queries", &self.queries.read().len())
            .field("updates", &self.updates.read().len())
            .finish()
    }
}

#[async_trait]
impl RelationalEffects for StatementRegistryHandler {
    async fn query(
        &self,
        statement: &str,
        params: &[DynamicValue],
    ) -> Result<Vec<Row>, RelationalError> {
        let handler = self
            .queries
            .read()
            .get(&normalize(statement))
            .cloned()
            .ok_or_else(|| RelationalError::UnsupportedStatement(statement.to_string()))?;
        handler(params)
    }

    async fn update(
        &self,
        statement: &str,
        params: &[DynamicValue],
    ) -> Result<u64, RelationalError> {
        let handler = self
            .updates
            .read()
            .get(&normalize(statement))
            .cloned()
            .ok_or_else(|| RelationalError::UnsupportedStatement(statement.to_string()))?;
        handler(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn answers_registered_statements() {
        let db = StatementRegistryHandler::new();
        db.register_query("SELECT name FROM users WHERE id = ?", |params| {
            let id = params
                .first()
                .and_then(DynamicValue::as_f64)
                .ok_or_else(|| RelationalError::InvalidParameters("expected id".to_string()))?;
            Ok(vec![Row::from([(
                "name".to_string(),
                DynamicValue::from(format!("user-{id}")),
            )])])
        });
        db.register_update("DELETE FROM users", |_| Ok(3));

        let rows = db
            .query("SELECT name\n  FROM users WHERE id = ?", &[DynamicValue::from(7)])
            .await
            .unwrap();
        assert_eq!(rows[0]["name"], DynamicValue::from("user-7"));
        assert_eq!(db.update("DELETE FROM users", &[]).await.unwrap(), 3);

        assert_matches!(
            db.query("SELECT name FROM users WHERE id = ?", &[]).await,
            Err(RelationalError::InvalidParameters(_))
        );
        assert_matches!(
            db.query("DROP TABLE users", &[]).await,
            Err(RelationalError::UnsupportedStatement(_))
        );
    }
}
