// crates/infra-harness-core/src/core/outcome.rs
// ============================================================================
// Module: Scenario Outcomes
// Description: Per-check reports and the final scenario outcome.
// Purpose: Provide serializable run results for summaries and callers.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A scenario that reaches the check phase always produces a
//! [`ScenarioOutcome`]. A failing check marks the outcome failed; it is not an
//! error and never skips teardown.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ScenarioId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Aggregate scenario status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Every check held.
    Passed,
    /// At least one check failed.
    Failed,
}

impl ScenarioStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// Result of evaluating one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionReport {
    /// Check label.
    pub check: String,
    /// Whether the check held.
    pub passed: bool,
    /// Human-readable detail.
    pub message: String,
}

impl AssertionReport {
    /// Builds a passing report.
    #[must_use]
    pub fn pass(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            passed: true,
            message: message.into(),
        }
    }

    /// Builds a failing report.
    #[must_use]
    pub fn fail(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            passed: false,
            message: message.into(),
        }
    }
}

/// Teardown state recorded on an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum TeardownStatus {
    /// Destroy has not run yet.
    Pending,
    /// Destroy completed.
    Completed,
    /// Destroy reported an error.
    Failed(String),
}

/// Final result of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Scenario identifier.
    pub scenario_id: ScenarioId,
    /// Aggregate status.
    pub status: ScenarioStatus,
    /// Per-check reports in check order.
    pub assertions: Vec<AssertionReport>,
    /// Outputs read during the run.
    pub outputs: BTreeMap<String, String>,
    /// Teardown state.
    pub teardown: TeardownStatus,
}

impl ScenarioOutcome {
    /// Builds an outcome from check reports; status follows the reports.
    #[must_use]
    pub fn from_reports(
        scenario_id: ScenarioId,
        assertions: Vec<AssertionReport>,
        outputs: BTreeMap<String, String>,
    ) -> Self {
        let status = if assertions.iter().all(|report| report.passed) {
            ScenarioStatus::Passed
        } else {
            ScenarioStatus::Failed
        };
        Self {
            scenario_id,
            status,
            assertions,
            outputs,
            teardown: TeardownStatus::Pending,
        }
    }

    /// Returns true when the scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }

    /// Returns the first failing check, if any.
    #[must_use]
    pub fn first_failure(&self) -> Option<&AssertionReport> {
        self.assertions.iter().find(|report| !report.passed)
    }
}
