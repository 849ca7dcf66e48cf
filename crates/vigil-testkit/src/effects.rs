//! In-memory capability sets
//!
//! Every collaborator backed by an in-process handler, with the concrete
//! handles kept around so tests can seed and inspect them.

use crate::time::ControllableClock;
use std::sync::Arc;
use vigil_effects::{
    FunctionRegistryHandler, MemoryKeyValueHandler, MemoryObjectStoreHandler, MemoryPubSubHandler,
    MemoryQueueHandler, StatementRegistryHandler,
};
use vigil_engine::{Capabilities, StepInterpreter};

/// Concrete in-memory collaborators behind a [`Capabilities`] set
#[derive(Debug, Clone)]
pub struct MemoryCollaborators {
    /// Object store
    pub objects: MemoryObjectStoreHandler,
    /// Key-value tables
    pub tables: MemoryKeyValueHandler,
    /// Function registry, preloaded with `echo`
    pub functions: FunctionRegistryHandler,
    /// Queues
    pub queues: MemoryQueueHandler,
    /// Pub-sub topics
    pub pubsub: MemoryPubSubHandler,
    /// Relational statements
    pub relational: StatementRegistryHandler,
    /// Clock; sleeping advances it
    pub clock: ControllableClock,
}

impl MemoryCollaborators {
    /// Fresh, empty collaborators
    pub fn new() -> Self {
        Self {
            objects: MemoryObjectStoreHandler::new(),
            tables: MemoryKeyValueHandler::new(),
            functions: FunctionRegistryHandler::with_builtins(),
            queues: MemoryQueueHandler::new(),
            pubsub: MemoryPubSubHandler::new(),
            relational: StatementRegistryHandler::new(),
            clock: ControllableClock::new(0),
        }
    }

    /// Capability set sharing state with these handles
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            object_store: Arc::new(self.objects.clone()),
            key_value: Arc::new(self.tables.clone()),
            functions: Arc::new(self.functions.clone()),
            queues: Arc::new(self.queues.clone()),
            pubsub: Arc::new(self.pubsub.clone()),
            relational: Arc::new(self.relational.clone()),
            time: Arc::new(self.clock.clone()),
        }
    }

    /// Step interpreter over these collaborators
    pub fn interpreter(&self) -> StepInterpreter {
        StepInterpreter::new(self.capabilities())
    }
}

impl Default for MemoryCollaborators {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability set over fresh in-memory collaborators
pub fn memory_capabilities() -> Capabilities {
    MemoryCollaborators::new().capabilities()
}
