//! Function registry handler
//!
//! Functions are plain closures registered by name at startup.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use vigil_core::effects::{FunctionEffects, FunctionError};

/// A registered function: payload in, payload or error message out
pub type FunctionHandler = Arc<dyn Fn(&str) -> Result<String, String> + Send + Sync>;

/// In-process function registry
#[derive(Clone, Default)]
pub struct FunctionRegistryHandler {
    functions: Arc<RwLock<BTreeMap<String, FunctionHandler>>>,
}

impl FunctionRegistryHandler {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `echo`, which returns its payload unchanged
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("echo", |payload| Ok(payload.to_string()));
        registry
    }

    /// Register or replace a function
    pub fn register<F>(&self, name: impl Into<String>, function: F)
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        self.functions.write().insert(name.into(), Arc::new(function));
    }

    /// Names of all registered functions, sorted
    pub fn names(&self) -> Vec<String> {
        self.functions.read().keys().cloned().collect()
    }
}

impl fmt::Debug for FunctionRegistryHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistryHandler")
            .field("functions", &self.names())
            .finish()
    }
}

#[async_trait]
impl FunctionEffects for FunctionRegistryHandler {
    async fn invoke(&self, name: &str, payload: &str) -> Result<String, FunctionError> {
        let function = self
            .functions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| FunctionError::NotFound(name.to_string()))?;
        function(payload).map_err(|reason| FunctionError::Failed {
            name: name.to_string(),
            reason,
        })
    }
}
