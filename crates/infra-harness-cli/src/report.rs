// crates/infra-harness-cli/src/report.rs
// ============================================================================
// Module: Run Reports
// Description: Per-run artifact roots and deterministic run summaries.
// Purpose: Persist what each scenario did so CI can archive the result.
// Dependencies: infra-harness-core, serde, serde_jcs
// ============================================================================

//! ## Overview
//! A [`RunReporter`] owns one artifact root per CLI invocation and writes
//! `summary.json` (canonical JSON) plus `summary.md` when the run finishes.
//! When the reporter is dropped without an explicit summary (for example a
//! panic escaping a collaborator) it still writes a summary marked `panic`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use infra_harness_core::AssertionReport;
use infra_harness_core::HarnessError;
use infra_harness_core::ScenarioId;
use infra_harness_core::ScenarioOutcome;
use infra_harness_core::TeardownStatus;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default parent directory for run artifacts.
pub const DEFAULT_RUN_ROOT: &str = "target/infra-harness";
/// Canonical JSON summary filename.
pub const SUMMARY_JSON: &str = "summary.json";
/// Markdown summary filename.
pub const SUMMARY_MARKDOWN: &str = "summary.md";

// ============================================================================
// SECTION: Summary Types
// ============================================================================

/// What a CLI invocation did with the selected scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Full apply, check, destroy cycle.
    Run,
    /// Static validation only; nothing was provisioned.
    Validate,
}

/// Per-scenario entry in a run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioSummary {
    /// Scenario identifier.
    pub scenario_id: ScenarioId,
    /// `passed`, `failed`, or `error`.
    pub status: String,
    /// Error category when the scenario errored.
    pub error_kind: Option<String>,
    /// Error detail when the scenario errored.
    pub message: Option<String>,
    /// Per-check reports.
    pub assertions: Vec<AssertionReport>,
    /// Outputs read during the run.
    pub outputs: BTreeMap<String, String>,
    /// Teardown state when the run completed.
    pub teardown: Option<TeardownStatus>,
    /// Wall-clock duration.
    pub duration_ms: u128,
}

impl ScenarioSummary {
    /// Summarizes a completed scenario outcome.
    #[must_use]
    pub fn from_outcome(outcome: ScenarioOutcome, duration_ms: u128) -> Self {
        let message = outcome.first_failure().map(|report| report.message.clone());
        Self {
            scenario_id: outcome.scenario_id,
            status: outcome.status.as_str().to_string(),
            error_kind: None,
            message,
            assertions: outcome.assertions,
            outputs: outcome.outputs,
            teardown: Some(outcome.teardown),
            duration_ms,
        }
    }

    /// Summarizes a scenario that ended in a harness error.
    #[must_use]
    pub fn from_error(scenario_id: ScenarioId, err: &HarnessError, duration_ms: u128) -> Self {
        Self::errored(scenario_id, err.kind(), err.to_string(), duration_ms)
    }

    /// Summarizes a scenario that errored before or outside the harness.
    #[must_use]
    pub fn errored(
        scenario_id: ScenarioId,
        kind: &str,
        message: String,
        duration_ms: u128,
    ) -> Self {
        Self {
            scenario_id,
            status: "error".to_string(),
            error_kind: Some(kind.to_string()),
            message: Some(message),
            assertions: Vec::new(),
            outputs: BTreeMap::new(),
            teardown: None,
            duration_ms,
        }
    }

    /// Summarizes a scenario whose definitions passed static validation.
    #[must_use]
    pub fn validated(scenario_id: ScenarioId, duration_ms: u128) -> Self {
        Self {
            scenario_id,
            status: "passed".to_string(),
            error_kind: None,
            message: None,
            assertions: Vec::new(),
            outputs: BTreeMap::new(),
            teardown: None,
            duration_ms,
        }
    }

    /// Returns true when the scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == "passed"
    }
}

/// Summary of one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Suite file the scenarios came from.
    pub suite: String,
    /// Run mode.
    pub mode: RunMode,
    /// `passed`, `failed`, or `panic`.
    pub status: String,
    /// Start time in ms since epoch.
    pub started_at_ms: u128,
    /// End time in ms since epoch.
    pub ended_at_ms: u128,
    /// Wall-clock duration.
    pub duration_ms: u128,
    /// Per-scenario summaries in execution order.
    pub scenarios: Vec<ScenarioSummary>,
}

impl RunSummary {
    /// Returns true when every scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == "passed"
    }

    /// Returns the number of scenarios that did not pass.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.scenarios.iter().filter(|scenario| !scenario.passed()).count()
    }
}

/// Returns the aggregate status label for a set of scenario summaries.
fn aggregate_status(scenarios: &[ScenarioSummary]) -> &'static str {
    if scenarios.iter().all(ScenarioSummary::passed) { "passed" } else { "failed" }
}

// ============================================================================
// SECTION: Artifacts
// ============================================================================

/// Returns the current time in ms since epoch.
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Artifact directory for a single run.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    /// Root directory for this run.
    root: PathBuf,
}

impl RunArtifacts {
    /// Creates `run_<stamp>` under `parent` (or the default root).
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory cannot be created.
    pub fn create(parent: Option<&Path>) -> io::Result<Self> {
        let parent = parent.map_or_else(|| PathBuf::from(DEFAULT_RUN_ROOT), Path::to_path_buf);
        let root = parent.join(format!("run_{}", now_millis()));
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
        })
    }

    /// Returns the root directory for the run artifacts.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a JSON artifact using canonical JCS serialization.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when serialization or the write fails.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        let bytes = serde_jcs::to_vec(value).map_err(|err| io::Error::other(err.to_string()))?;
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Writes a text artifact with UTF-8 encoding.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the write fails.
    pub fn write_text(&self, name: &str, value: &str) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        fs::write(&path, value.as_bytes())?;
        Ok(path)
    }
}

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// Collects scenario summaries and writes them when the run ends.
pub struct RunReporter {
    /// Artifact directory.
    artifacts: RunArtifacts,
    /// Suite label recorded in the summary.
    suite: String,
    /// Run mode.
    mode: RunMode,
    /// Start time in ms since epoch.
    started_at_ms: u128,
    /// Scenario summaries recorded so far.
    scenarios: Vec<ScenarioSummary>,
    /// True once a summary has been written.
    finalized: bool,
}

impl RunReporter {
    /// Creates a reporter with a fresh artifact root.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the artifact root cannot be created.
    pub fn new(suite: &Path, mode: RunMode, run_root: Option<&Path>) -> io::Result<Self> {
        Ok(Self {
            artifacts: RunArtifacts::create(run_root)?,
            suite: suite.display().to_string(),
            mode,
            started_at_ms: now_millis(),
            scenarios: Vec::new(),
            finalized: false,
        })
    }

    /// Returns the artifact manager.
    #[must_use]
    pub const fn artifacts(&self) -> &RunArtifacts {
        &self.artifacts
    }

    /// Records one scenario summary.
    pub fn record(&mut self, summary: ScenarioSummary) {
        self.scenarios.push(summary);
    }

    /// Writes the final summary and returns it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when an artifact cannot be written.
    pub fn finish(&mut self) -> io::Result<RunSummary> {
        let status = aggregate_status(&self.scenarios);
        self.write_summary(status)
    }

    /// Builds and writes a summary with the given status.
    fn write_summary(&mut self, status: &str) -> io::Result<RunSummary> {
        let ended_at_ms = now_millis();
        let summary = RunSummary {
            suite: self.suite.clone(),
            mode: self.mode,
            status: status.to_string(),
            started_at_ms: self.started_at_ms,
            ended_at_ms,
            duration_ms: ended_at_ms.saturating_sub(self.started_at_ms),
            scenarios: self.scenarios.clone(),
        };
        self.artifacts.write_json(SUMMARY_JSON, &summary)?;
        self.artifacts.write_text(SUMMARY_MARKDOWN, &summary_markdown(&summary))?;
        self.finalized = true;
        Ok(summary)
    }
}

impl Drop for RunReporter {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        let status = if std::thread::panicking() { "panic" } else { "incomplete" };
        let _ = self.write_summary(status);
    }
}

// ============================================================================
// SECTION: Markdown
// ============================================================================

/// Renders a run summary as Markdown.
#[must_use]
pub fn summary_markdown(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str("# Infra Harness Run Summary\n\n");
    out.push_str("## Status\n\n");
    let _ = writeln!(out, "- Suite: {}", summary.suite);
    let _ = writeln!(out, "- Mode: {}", mode_label(summary.mode));
    let _ = writeln!(out, "- Status: {}", summary.status);
    let _ = writeln!(out, "- Duration (ms): {}", summary.duration_ms);
    out.push_str("\n## Scenarios\n\n");
    if summary.scenarios.is_empty() {
        out.push_str("- None\n");
    }
    for scenario in &summary.scenarios {
        let _ = writeln!(
            out,
            "- {}: {} ({} ms)",
            scenario.scenario_id, scenario.status, scenario.duration_ms
        );
        if let Some(message) = &scenario.message {
            let _ = writeln!(out, "  - {message}");
        }
        for report in &scenario.assertions {
            let mark = if report.passed { "pass" } else { "fail" };
            let _ = writeln!(out, "  - [{mark}] {}", report.check);
        }
    }
    out
}

/// Returns a stable label for a run mode.
const fn mode_label(mode: RunMode) -> &'static str {
    match mode {
        RunMode::Run => "run",
        RunMode::Validate => "validate",
    }
}
