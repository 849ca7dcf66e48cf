//! Vigil Server - HTTP trigger and command line runner
//!
//! [`bootstrap`] turns configuration into a ready [`vigil_engine::ExecutionService`]
//! with local collaborators; [`app`] exposes it over HTTP.

#![forbid(unsafe_code)]

pub mod app;
pub mod bootstrap;

pub use app::{router, AppState};
pub use bootstrap::{build_service, load_config, local_capabilities, ConfigOverrides};
