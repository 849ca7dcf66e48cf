//! Scenario executor seam

use crate::error::ScenarioFault;
use crate::scenario::Scenario;
use async_trait::async_trait;
use vigil_core::config::EnvironmentProfile;

/// Per-run context handed to every scenario of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Identifier of the run
    pub run_id: String,
    /// Resolved environment name
    pub environment: String,
    /// Resolved environment profile
    pub profile: EnvironmentProfile,
}

impl ExecutionContext {
    /// Context for an environment whose prefix is its own name
    pub fn for_environment(run_id: impl Into<String>, environment: &str) -> Self {
        Self {
            run_id: run_id.into(),
            environment: environment.to_string(),
            profile: EnvironmentProfile::named(environment),
        }
    }

    /// Qualify a collaborator resource name with the environment prefix
    pub fn qualify(&self, name: &str) -> String {
        self.profile.qualify(name)
    }

    /// Look up a template variable.
    ///
    /// `environment` and `run_id` are always defined; everything else comes
    /// from the environment profile.
    pub fn variable(&self, name: &str) -> Option<&str> {
        match name {
            "environment" => Some(&self.environment),
            "run_id" => Some(&self.run_id),
            _ => self.profile.variables.get(name).map(String::as_str),
        }
    }
}

/// Runs a single scenario to completion
///
/// Implementations report failure through [`ScenarioFault`]; panics are
/// also tolerated and caught by the scheduler.
#[async_trait]
pub trait ScenarioExecutor: Send + Sync {
    /// Execute one scenario
    async fn execute(&self, scenario: &Scenario, context: &ExecutionContext) -> Result<(), ScenarioFault>;
}
