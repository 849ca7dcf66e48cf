//! Execution request and response records

use crate::aggregator::ExecutionSummary;
use serde::{Deserialize, Serialize};

/// Message of a run in which every scenario passed
pub const MESSAGE_SUCCESS: &str = "All tests passed successfully";

/// Message of a run that completed with failed scenarios
pub const MESSAGE_PARTIAL_FAILURE: &str = "Test execution completed with failures";

/// A request to run part of the catalog
///
/// Every field is optional; an empty JSON object selects everything in the
/// default environment with the default worker count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionRequest {
    /// Target environment; unknown names fall back to the default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Tag labels, combined with logical OR
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Single scenario path; takes precedence over `tags`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    /// Worker count, clamped into the configured range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<i64>,
    /// Outer deadline for the whole run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl ExecutionRequest {
    /// Request selecting scenarios by tag
    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Some(tags.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Request selecting a single scenario
    pub fn with_feature(feature: impl Into<String>) -> Self {
        Self {
            feature: Some(feature.into()),
            ..Self::default()
        }
    }

    /// Set the worker count
    pub fn threads(mut self, threads: i64) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Set the target environment
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Set the outer deadline
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Terminal classification of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Completed with no failed scenarios (including an empty selection)
    FullSuccess,
    /// Completed with at least one failed scenario
    PartialFailure,
    /// Never ran meaningfully
    ExecutionFault,
}

impl ExecutionStatus {
    /// Classify a completed run
    pub fn classify(summary: &ExecutionSummary) -> Self {
        if summary.failed_scenarios == 0 {
            Self::FullSuccess
        } else {
            Self::PartialFailure
        }
    }

    /// HTTP status code reported for this classification
    pub fn http_status(self) -> u16 {
        match self {
            Self::FullSuccess => 200,
            Self::PartialFailure => 206,
            Self::ExecutionFault => 500,
        }
    }

    /// Process exit code reported by the command line runner
    pub fn exit_code(self) -> i32 {
        match self {
            Self::FullSuccess => 0,
            Self::PartialFailure => 1,
            Self::ExecutionFault => 2,
        }
    }

    /// Whether the response is a success
    pub fn is_success(self) -> bool {
        matches!(self, Self::FullSuccess)
    }
}

/// Response body of an execution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    /// True only for a full success
    pub success: bool,
    /// Summary of the classification
    pub message: String,
    /// Scenarios selected
    pub total_scenarios: usize,
    /// Scenarios that passed
    pub passed_scenarios: usize,
    /// Scenarios that failed
    pub failed_scenarios: usize,
    /// Wall-clock span of the run
    pub duration_ms: u64,
    /// Where the run's report is written
    pub report_path: String,
    /// Completion instant, epoch milliseconds
    pub timestamp: u64,
    /// Failure details; present only when something failed
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub errors: Option<Vec<String>>,
}

impl ExecutionResponse {
    /// Response for a completed run
    pub fn completed(summary: ExecutionSummary, status: ExecutionStatus) -> Self {
        let message = if status.is_success() {
            MESSAGE_SUCCESS
        } else {
            MESSAGE_PARTIAL_FAILURE
        };
        Self {
            success: status.is_success(),
            message: message.to_string(),
            total_scenarios: summary.total_scenarios,
            passed_scenarios: summary.passed_scenarios,
            failed_scenarios: summary.failed_scenarios,
            duration_ms: summary.duration_ms,
            report_path: summary.report_path,
            timestamp: summary.timestamp,
            errors: (!summary.errors.is_empty()).then_some(summary.errors),
        }
    }

    /// Response for a run that faulted before producing outcomes
    pub fn fault(error: &str, duration_ms: u64, timestamp: u64) -> Self {
        Self {
            success: false,
            message: format!("Test execution failed: {error}"),
            total_scenarios: 0,
            passed_scenarios: 0,
            failed_scenarios: 0,
            duration_ms,
            report_path: String::new(),
            timestamp,
            errors: Some(vec![error.to_string()]),
        }
    }
}
