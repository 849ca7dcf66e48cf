//! Configuration for the Vigil service
//!
//! Configuration is layered: built-in defaults, an optional TOML file,
//! `VIGIL_*` environment variables and finally command line overrides. The
//! resulting [`ServiceConfig`] is built once at startup and passed explicitly
//! to everything that needs it.

pub mod service;
pub mod traits;
pub mod validation;

pub use service::{
    CatalogConfig, EnvironmentProfile, ExecutionConfig, ResolvedEnvironment, ServerConfig,
    ServiceConfig,
};
pub use traits::VigilConfig;
pub use validation::{ConfigValidator, ValidationError};
