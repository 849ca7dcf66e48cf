//! Execution service
//!
//! Drives one request through `Idle -> Resolving -> Running -> Aggregating ->
//! Completed`, or into `Faulted` when the request cannot be resolved. Only
//! pre-run faults reach `Faulted`; scenario failures are contained by the
//! scheduler and end in `Completed`.

use crate::aggregator::aggregate;
use crate::catalog::ScenarioCatalog;
use crate::executor::{ExecutionContext, ScenarioExecutor};
use crate::request::{ExecutionRequest, ExecutionResponse, ExecutionStatus};
use crate::scheduler::{clamp_threads, ExecutionScheduler};
use crate::selection::SelectionResolver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;
use vigil_core::effects::TimeEffects;
use vigil_core::ServiceConfig;

/// Lifecycle phase of one execution request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionPhase {
    /// Request received, nothing done yet
    Idle,
    /// Resolving environment and selection
    Resolving,
    /// Scheduler running the selection
    Running,
    /// Folding outcomes into a summary
    Aggregating,
    /// Terminal: the run completed
    Completed,
    /// Terminal: the run never started meaningfully
    Faulted,
}

impl ExecutionPhase {
    /// Whether `next` is a legal successor of this phase
    pub fn can_transition_to(self, next: ExecutionPhase) -> bool {
        use ExecutionPhase::*;
        matches!(
            (self, next),
            (Idle, Resolving)
                | (Resolving, Running)
                | (Running, Aggregating)
                | (Aggregating, Completed)
                | (Idle | Resolving | Running | Aggregating, Faulted)
        )
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionPhase::Completed | ExecutionPhase::Faulted)
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionPhase::Idle => "idle",
            ExecutionPhase::Resolving => "resolving",
            ExecutionPhase::Running => "running",
            ExecutionPhase::Aggregating => "aggregating",
            ExecutionPhase::Completed => "completed",
            ExecutionPhase::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct PhaseTracker {
    history: Vec<ExecutionPhase>,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            history: vec![ExecutionPhase::Idle],
        }
    }

    fn current(&self) -> ExecutionPhase {
        self.history
            .last()
            .copied()
            .unwrap_or(ExecutionPhase::Idle)
    }

    fn advance(&mut self, next: ExecutionPhase) {
        let current = self.current();
        if !current.can_transition_to(next) {
            error!(from = %current, to = %next, "illegal execution phase transition");
        }
        debug!(from = %current, to = %next, "execution phase");
        self.history.push(next);
    }

    fn into_history(self) -> Vec<ExecutionPhase> {
        self.history
    }
}

/// Result of one request: classification, response body and phase history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Identifier of the run
    pub run_id: String,
    /// Terminal classification
    pub status: ExecutionStatus,
    /// Response body
    pub response: ExecutionResponse,
    /// Phases visited, starting with `Idle`
    pub phases: Vec<ExecutionPhase>,
}

impl ExecutionReport {
    /// Final phase reached
    pub fn final_phase(&self) -> ExecutionPhase {
        self.phases
            .last()
            .copied()
            .unwrap_or(ExecutionPhase::Idle)
    }
}

/// Entry point for execution requests
///
/// Holds the configuration and catalog loaded at startup and the executor
/// scenarios run through. Each call to [`ExecutionService::execute`] gets its
/// own scheduler and worker pool, so concurrent requests share nothing but
/// these read-only handles.
#[derive(Clone)]
pub struct ExecutionService {
    config: Arc<ServiceConfig>,
    catalog: Arc<ScenarioCatalog>,
    executor: Arc<dyn ScenarioExecutor>,
    time: Arc<dyn TimeEffects>,
}

impl fmt::Debug for ExecutionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionService")
            .field("scenarios", &self.catalog.len())
            .field("default_environment", &self.config.default_environment)
            .finish_non_exhaustive()
    }
}

impl ExecutionService {
    /// Create a service
    pub fn new(
        config: Arc<ServiceConfig>,
        catalog: Arc<ScenarioCatalog>,
        executor: Arc<dyn ScenarioExecutor>,
        time: Arc<dyn TimeEffects>,
    ) -> Self {
        Self {
            config,
            catalog,
            executor,
            time,
        }
    }

    /// Scenario catalog served by this instance
    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// Configuration this instance was built with
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run a request to a terminal phase. Never fails: every error becomes a
    /// classified response.
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionReport {
        let run_id = Uuid::new_v4().to_string();
        let environment = request
            .environment
            .clone()
            .unwrap_or_else(|| self.config.default_environment.clone());
        let span = info_span!("execution", run_id = %run_id, environment = %environment);
        self.execute_run(run_id, request).instrument(span).await
    }

    /// Report a request that could not even be parsed
    pub async fn fault(&self, error: &str) -> ExecutionReport {
        let run_id = Uuid::new_v4().to_string();
        let mut phases = PhaseTracker::new();
        phases.advance(ExecutionPhase::Resolving);
        let started_at = self.time.current_timestamp_millis().await;
        self.faulted(run_id, phases, error, started_at).await
    }

    async fn execute_run(&self, run_id: String, request: ExecutionRequest) -> ExecutionReport {
        let started_at = self.time.current_timestamp_millis().await;
        let mut phases = PhaseTracker::new();
        phases.advance(ExecutionPhase::Resolving);

        let environment = match self
            .config
            .resolve_environment(request.environment.as_deref())
        {
            Ok(environment) => environment,
            Err(err) => {
                return self
                    .faulted(run_id, phases, &err.to_string(), started_at)
                    .await
            }
        };

        let selection = match SelectionResolver::new(self.catalog.clone()).resolve(&request) {
            Ok(selection) => selection,
            Err(err) => {
                return self
                    .faulted(run_id, phases, &err.to_string(), started_at)
                    .await
            }
        };

        phases.advance(ExecutionPhase::Running);
        let requested_threads = request
            .threads
            .unwrap_or_else(|| i64::from(self.config.execution.default_threads));
        let threads = clamp_threads(
            requested_threads,
            self.config.execution.max_threads as usize,
        );
        let deadline = request
            .timeout_ms
            .or(self.config.execution.default_timeout_ms);
        info!(
            scenarios = selection.len(),
            threads,
            environment = %environment.name,
            deadline_ms = ?deadline,
            "running selection"
        );

        let context = Arc::new(ExecutionContext {
            run_id: run_id.clone(),
            environment: environment.name.clone(),
            profile: environment.profile.clone(),
        });
        let scheduler = ExecutionScheduler::new(self.executor.clone(), context);
        let outcomes = match deadline {
            Some(ms) => {
                scheduler
                    .run_with_deadline(selection, threads, Duration::from_millis(ms))
                    .await
            }
            None => scheduler.run(selection, threads).await,
        };

        phases.advance(ExecutionPhase::Aggregating);
        let completed_at = self.time.current_timestamp_millis().await;
        let report_path = self
            .config
            .execution
            .report_dir
            .join(&run_id)
            .display()
            .to_string();
        let summary = aggregate(&outcomes, started_at, completed_at, report_path);

        phases.advance(ExecutionPhase::Completed);
        let status = ExecutionStatus::classify(&summary);
        info!(
            total = summary.total_scenarios,
            passed = summary.passed_scenarios,
            failed = summary.failed_scenarios,
            duration_ms = summary.duration_ms,
            ?status,
            "execution completed"
        );

        let mut response = ExecutionResponse::completed(summary, status);
        if let Some(requested) = &environment.fell_back_from {
            response.message = format!(
                "{} (unknown environment '{requested}', used '{}')",
                response.message, environment.name
            );
        }

        ExecutionReport {
            run_id,
            status,
            response,
            phases: phases.into_history(),
        }
    }

    async fn faulted(
        &self,
        run_id: String,
        mut phases: PhaseTracker,
        error: &str,
        started_at: u64,
    ) -> ExecutionReport {
        warn!(error, "execution faulted");
        phases.advance(ExecutionPhase::Faulted);
        let now = self.time.current_timestamp_millis().await;
        ExecutionReport {
            run_id,
            status: ExecutionStatus::ExecutionFault,
            response: ExecutionResponse::fault(error, now.saturating_sub(started_at), now),
            phases: phases.into_history(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScenarioFault;
    use crate::scenario::Scenario;
    use async_trait::async_trait;
    use vigil_effects::RealTimeHandler;

    struct FailTagged;

    #[async_trait]
    impl ScenarioExecutor for FailTagged {
        async fn execute(&self, scenario: &Scenario, _context: &ExecutionContext) -> Result<(), ScenarioFault> {
            if scenario.has_tag("fail") {
                Err(ScenarioFault::assertion("nope"))
            } else {
                Ok(())
            }
        }
    }

    fn service() -> ExecutionService {
        let catalog = ScenarioCatalog::from_scenarios([
            Scenario::tagged("a.toml", ["@smoke"]),
            Scenario::tagged("b.toml", ["@smoke", "@fail"]),
        ])
        .unwrap();
        ExecutionService::new(
            Arc::new(ServiceConfig::default()),
            Arc::new(catalog),
            Arc::new(FailTagged),
            Arc::new(RealTimeHandler::new()),
        )
    }

    #[test]
    fn phase_transitions() {
        use ExecutionPhase::*;
        assert!(Idle.can_transition_to(Resolving));
        assert!(Resolving.can_transition_to(Faulted));
        assert!(Running.can_transition_to(Aggregating));
        assert!(!Resolving.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Faulted));
        assert!(!Faulted.can_transition_to(Running));
        assert!(Completed.is_terminal());
    }

    #[tokio::test]
    async fn completed_run_visits_every_phase() {
        let report = service().execute(ExecutionRequest::default()).await;
        assert_eq!(
            report.phases,
            vec![
                ExecutionPhase::Idle,
                ExecutionPhase::Resolving,
                ExecutionPhase::Running,
                ExecutionPhase::Aggregating,
                ExecutionPhase::Completed,
            ]
        );
        assert_eq!(report.status, ExecutionStatus::PartialFailure);
        assert_eq!(report.response.errors, Some(vec!["b.toml: assertion failed: nope".to_string()]));
        assert!(report.response.report_path.ends_with(&report.run_id));
    }

    #[tokio::test]
    async fn unknown_feature_faults() {
        let report = service()
            .execute(ExecutionRequest::with_feature("missing.toml"))
            .await;
        assert_eq!(report.final_phase(), ExecutionPhase::Faulted);
        assert_eq!(report.status, ExecutionStatus::ExecutionFault);
        assert_eq!(
            report.response.errors,
            Some(vec!["Scenario not found: missing.toml".to_string()])
        );
    }

    #[tokio::test]
    async fn unknown_environment_falls_back() {
        let report = service()
            .execute(ExecutionRequest::with_feature("a.toml").environment("moon"))
            .await;
        assert_eq!(report.status, ExecutionStatus::FullSuccess);
        assert_eq!(
            report.response.message,
            "All tests passed successfully (unknown environment 'moon', used 'dev')"
        );
    }
}
