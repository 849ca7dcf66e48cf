//! Vigil Effects - local handlers for collaborator capabilities
//!
//! Every trait in `vigil_core::effects` has a handler here that runs inside
//! the process: a system clock, a filesystem or in-memory object store, and
//! in-memory key-value tables, queues, topics, functions and relational
//! statements. The server wires these into the scenario capability set.

#![forbid(unsafe_code)]

pub mod function;
pub mod key_value;
pub mod object_store;
pub mod pubsub;
pub mod queue;
pub mod relational;
pub mod time;

pub use function::FunctionRegistryHandler;
pub use key_value::MemoryKeyValueHandler;
pub use object_store::{FilesystemObjectStoreHandler, MemoryObjectStoreHandler};
pub use pubsub::MemoryPubSubHandler;
pub use queue::MemoryQueueHandler;
pub use relational::StatementRegistryHandler;
pub use time::RealTimeHandler;
