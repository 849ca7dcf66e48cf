//! Vigil Testing Infrastructure
//!
//! Shared fixtures for engine and server tests: catalog builders, scripted
//! executors, a controllable clock, in-memory capability sets and proptest
//! strategies.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! vigil-testkit = { path = "../vigil-testkit" }
//! ```
//!
//! ```rust,no_run
//! use vigil_testkit::*;
//!
//! # async fn demo() {
//! let catalog = catalog_from([
//!     ScenarioBuilder::new("smoke/a.toml").tag("@smoke").build(),
//!     ScenarioBuilder::new("smoke/b.toml").tag("@smoke").build(),
//! ]);
//! let executor = ScriptedExecutor::new().fail("smoke/b.toml", "broken");
//! let service = service_with(catalog, executor);
//! let report = service.execute(Default::default()).await;
//! assert_eq!(report.response.failed_scenarios, 1);
//! # }
//! ```

pub mod builders;
pub mod effects;
pub mod executors;
pub mod strategies;
pub mod time;

pub use builders::*;
pub use effects::*;
pub use executors::*;
pub use time::*;
