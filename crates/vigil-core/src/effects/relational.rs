//! Relational access effect trait

use crate::value::{DynamicMap, DynamicValue};
use async_trait::async_trait;

/// One result row: column name to value
pub type Row = DynamicMap;

/// Relational access errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelationalError {
    /// The backend does not know how to run the statement
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),
    /// Parameter count or type mismatch
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    /// Backend failure
    #[error("Relational backend failure: {0}")]
    Backend(String),
}

/// Relational capability: statement + positional parameters
#[async_trait]
pub trait RelationalEffects: Send + Sync {
    /// Run a query and return its rows
    async fn query(
        &self,
        statement: &str,
        params: &[DynamicValue],
    ) -> Result<Vec<Row>, RelationalError>;

    /// Run an update and return the number of affected rows
    async fn update(&self, statement: &str, params: &[DynamicValue])
        -> Result<u64, RelationalError>;
}
