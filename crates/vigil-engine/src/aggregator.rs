//! Result aggregation
//!
//! [`aggregate`] is a pure reduction of scenario outcomes into an
//! [`ExecutionSummary`]. It does not depend on outcome order.

use serde::{Deserialize, Serialize};

/// Result of running one scenario once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutcome {
    /// Scenario path
    pub scenario_id: String,
    /// Whether the scenario passed
    pub passed: bool,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_detail: Option<String>,
    /// Time spent running the scenario
    pub duration_ms: u64,
}

impl ScenarioOutcome {
    /// A passing outcome
    pub fn passed(scenario_id: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            passed: true,
            error_detail: None,
            duration_ms,
        }
    }

    /// A failing outcome
    pub fn failed(scenario_id: impl Into<String>, detail: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            passed: false,
            error_detail: Some(detail.into()),
            duration_ms,
        }
    }
}

/// Totals of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    /// Outcomes folded
    pub total_scenarios: usize,
    /// Passing outcomes
    pub passed_scenarios: usize,
    /// Failing outcomes
    pub failed_scenarios: usize,
    /// Wall-clock span of the run, not the sum of scenario durations
    pub duration_ms: u64,
    /// Report location for the run
    pub report_path: String,
    /// Completion instant, epoch milliseconds
    pub timestamp: u64,
    /// `"<scenarioId>: <errorDetail>"` for each failure, sorted
    pub errors: Vec<String>,
}

/// Fold outcomes into a summary
pub fn aggregate(
    outcomes: &[ScenarioOutcome],
    started_at_ms: u64,
    completed_at_ms: u64,
    report_path: impl Into<String>,
) -> ExecutionSummary {
    let passed = outcomes.iter().filter(|o| o.passed).count();

    let mut failures: Vec<&ScenarioOutcome> = outcomes.iter().filter(|o| !o.passed).collect();
    failures.sort_by(|a, b| {
        a.scenario_id
            .cmp(&b.scenario_id)
            .then_with(|| a.error_detail.cmp(&b.error_detail))
    });
    let errors = failures
        .iter()
        .map(|o| {
            let detail = o.error_detail.as_deref().unwrap_or("failed");
            format!("{}: {detail}", o.scenario_id)
        })
        .collect();

    ExecutionSummary {
        total_scenarios: outcomes.len(),
        passed_scenarios: passed,
        failed_scenarios: outcomes.len() - passed,
        duration_ms: completed_at_ms.saturating_sub(started_at_ms),
        report_path: report_path.into(),
        timestamp: completed_at_ms,
        errors,
    }
}
