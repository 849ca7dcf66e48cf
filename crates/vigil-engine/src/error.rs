//! Engine error types
//!
//! [`CatalogError`] and [`SelectionError`] are pre-run faults and escalate to
//! an execution fault. [`ScenarioFault`] is contained at scenario
//! granularity: the scheduler turns it into a failed outcome.

use std::path::PathBuf;
use vigil_core::effects::{
    FunctionError, KeyValueError, ObjectStoreError, PubSubError, QueueError, RelationalError,
};
use vigil_core::{CodecError, VigilError};

/// Failures while building a scenario catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The catalog root directory does not exist
    #[error("Catalog root not found: {}", path.display())]
    MissingRoot {
        /// Configured root
        path: PathBuf,
    },
    /// A scenario file could not be read
    #[error("Failed to read scenario {}: {message}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        message: String,
    },
    /// A scenario file is not valid scenario TOML
    #[error("Invalid scenario {}: {message}", path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Parser error
        message: String,
    },
    /// The discovery pattern could not be built
    #[error("Invalid discovery pattern: {0}")]
    Pattern(String),
    /// Two scenarios share an identifier
    #[error("Duplicate scenario path: {0}")]
    Duplicate(String),
}

impl From<CatalogError> for VigilError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MissingRoot { .. } => VigilError::not_found(err.to_string()),
            _ => VigilError::invalid(err.to_string()),
        }
    }
}

/// Failures turning a request into a scenario selection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The requested feature path is not in the catalog
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),
    /// The request itself is unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<SelectionError> for VigilError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::ScenarioNotFound(_) => VigilError::not_found(err.to_string()),
            SelectionError::InvalidRequest(_) => VigilError::invalid(err.to_string()),
        }
    }
}

/// Failure of a single scenario run
///
/// The `Display` form is the outcome's `errorDetail`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioFault {
    /// An expectation did not hold
    #[error("assertion failed: {0}")]
    Assertion(String),
    /// A collaborator call failed
    #[error("{0}")]
    Collaborator(String),
    /// A value could not be marshalled
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    /// The scenario asked to fail
    #[error("{0}")]
    Failed(String),
    /// The scenario panicked
    #[error("panicked: {0}")]
    Panicked(String),
    /// The outer deadline expired before the scenario finished
    #[error("timed out after {after_ms}ms")]
    TimedOut {
        /// Deadline that expired
        after_ms: u64,
    },
    /// A fault raised by a specific step
    #[error("step {number} ({action}): {fault}")]
    Step {
        /// One-based step number
        number: usize,
        /// Step action name
        action: &'static str,
        /// Underlying fault
        fault: Box<ScenarioFault>,
    },
}

impl ScenarioFault {
    /// Build an assertion failure
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    /// Attribute this fault to a step
    pub fn at_step(self, number: usize, action: &'static str) -> Self {
        Self::Step {
            number,
            action,
            fault: Box::new(self),
        }
    }
}

macro_rules! collaborator_fault {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for ScenarioFault {
                fn from(err: $error) -> Self {
                    ScenarioFault::Collaborator(err.to_string())
                }
            }
        )*
    };
}

collaborator_fault!(
    ObjectStoreError,
    KeyValueError,
    FunctionError,
    QueueError,
    PubSubError,
    RelationalError,
);
