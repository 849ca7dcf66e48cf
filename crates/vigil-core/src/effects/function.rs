//! Function invocation effect trait

use async_trait::async_trait;

/// Function invocation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FunctionError {
    /// No function is registered under the name
    #[error("Function not found: {0}")]
    NotFound(String),
    /// The function ran and reported an error
    #[error("Function {name} failed: {reason}")]
    Failed {
        /// Function name
        name: String,
        /// Error reported by the function
        reason: String,
    },
}

/// Function invocation capability: name + payload in, payload out
#[async_trait]
pub trait FunctionEffects: Send + Sync {
    /// Invoke a function synchronously and return its response payload
    async fn invoke(&self, name: &str, payload: &str) -> Result<String, FunctionError>;
}
