//! Collaborator effect traits
//!
//! Each trait is a narrow capability consumed by scenarios. Implementations
//! live in `vigil-effects` (local handlers) and `vigil-testkit` (fixtures);
//! the engine only ever sees `Arc<dyn ...Effects>` handles injected at
//! construction time.

pub mod function;
pub mod key_value;
pub mod object_store;
pub mod pubsub;
pub mod queue;
pub mod relational;
pub mod time;

pub use function::{FunctionEffects, FunctionError};
pub use key_value::{KeyValueEffects, KeyValueError};
pub use object_store::{ObjectMetadata, ObjectStoreEffects, ObjectStoreError, UserMetadata};
pub use pubsub::{PubSubEffects, PubSubError};
pub use queue::{QueueEffects, QueueError, ReceivedMessage};
pub use relational::{RelationalEffects, RelationalError, Row};
pub use time::TimeEffects;
