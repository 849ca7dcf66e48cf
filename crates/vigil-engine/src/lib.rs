//! Vigil Engine - scenario selection, scheduling and aggregation
//!
//! The engine turns an [`ExecutionRequest`] into an [`ExecutionReport`]:
//!
//! 1. [`ScenarioCatalog`] holds every scenario discovered at startup
//! 2. [`SelectionResolver`] picks the scenarios a request names
//! 3. [`ExecutionScheduler`] runs them on a bounded worker pool, containing
//!    faults and panics at scenario granularity
//! 4. [`aggregate`] folds the outcomes into an [`ExecutionSummary`]
//! 5. [`ExecutionService`] drives the whole lifecycle and classifies the run
//!
//! Scenarios reach collaborators only through the [`Capabilities`] handed to
//! the [`StepInterpreter`].

#![forbid(unsafe_code)]

/// Result aggregation
pub mod aggregator;

/// Collaborator capability set and key-value facade
pub mod capabilities;

/// Scenario catalog
pub mod catalog;

/// Engine error types
pub mod error;

/// Scenario executor seam
pub mod executor;

/// Declarative step interpreter
pub mod interpreter;

/// Request and response types
pub mod request;

/// Scenario model and file format
pub mod scenario;

/// Bounded-concurrency scheduler
pub mod scheduler;

/// Selection resolution
pub mod selection;

/// Execution lifecycle
pub mod service;

pub use aggregator::{aggregate, ExecutionSummary, ScenarioOutcome};
pub use capabilities::{Capabilities, KeyValueTable, TableError};
pub use catalog::ScenarioCatalog;
pub use error::{CatalogError, ScenarioFault, SelectionError};
pub use executor::{ExecutionContext, ScenarioExecutor};
pub use interpreter::StepInterpreter;
pub use request::{
    ExecutionRequest, ExecutionResponse, ExecutionStatus, MESSAGE_PARTIAL_FAILURE,
    MESSAGE_SUCCESS,
};
pub use scenario::{Scenario, ScenarioFile, Step};
pub use scheduler::{clamp_threads, ExecutionScheduler, MAX_THREADS};
pub use selection::SelectionResolver;
pub use service::{ExecutionPhase, ExecutionReport, ExecutionService};
