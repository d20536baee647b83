// crates/infra-harness-core/src/audit.rs
// ============================================================================
// Module: Harness Audit Logging
// Description: Structured audit events for scenario lifecycles.
// Purpose: Emit JSON-line lifecycle logs without hard logging dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every lifecycle step of a scenario (apply, output reads, checks, destroy,
//! validation) is recorded as a [`HarnessAuditEvent`] through a
//! [`HarnessAuditSink`]. Sinks are lightweight so callers can route events to
//! stderr, an append-only file, or nowhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::ScenarioId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Lifecycle event classification.
///
/// # Invariants
/// - Labels are stable for log consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HarnessEventKind {
    /// Scenario execution began.
    ScenarioStarted,
    /// Apply was requested from the provisioner.
    ApplyRequested,
    /// Apply reported non-success.
    ApplyFailed,
    /// An output was read.
    OutputRead,
    /// A check was evaluated.
    AssertionEvaluated,
    /// Destroy completed.
    DestroyCompleted,
    /// Destroy reported non-success.
    DestroyFailed,
    /// Static validation finished.
    ValidateCompleted,
    /// Scenario execution finished.
    ScenarioFinished,
}

impl HarnessEventKind {
    /// Returns a stable label for the event kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScenarioStarted => "scenario_started",
            Self::ApplyRequested => "apply_requested",
            Self::ApplyFailed => "apply_failed",
            Self::OutputRead => "output_read",
            Self::AssertionEvaluated => "assertion_evaluated",
            Self::DestroyCompleted => "destroy_completed",
            Self::DestroyFailed => "destroy_failed",
            Self::ValidateCompleted => "validate_completed",
            Self::ScenarioFinished => "scenario_finished",
        }
    }
}

/// Harness audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct HarnessAuditEvent {
    /// Event kind.
    pub event: HarnessEventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Scenario identifier when the event belongs to a scenario.
    pub scenario_id: Option<String>,
    /// Subject of the event (output name, check label, or directory).
    pub subject: Option<String>,
    /// Outcome label (`ok`, `error`, `pass`, `fail`).
    pub outcome: Option<&'static str>,
    /// Optional detail message.
    pub message: Option<String>,
}

impl HarnessAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(event: HarnessEventKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            scenario_id: None,
            subject: None,
            outcome: None,
            message: None,
        }
    }

    /// Attaches the scenario identifier.
    #[must_use]
    pub fn scenario(mut self, scenario_id: &ScenarioId) -> Self {
        self.scenario_id = Some(scenario_id.to_string());
        self
    }

    /// Attaches the event subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attaches the outcome label.
    #[must_use]
    pub const fn outcome(mut self, outcome: &'static str) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Attaches a detail message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for harness lifecycle events.
pub trait HarnessAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &HarnessAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct HarnessStderrAuditSink;

impl HarnessAuditSink for HarnessStderrAuditSink {
    fn record(&self, event: &HarnessAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct HarnessFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl HarnessFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl HarnessAuditSink for HarnessFileAuditSink {
    fn record(&self, event: &HarnessAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct HarnessNoopAuditSink;

impl HarnessAuditSink for HarnessNoopAuditSink {
    fn record(&self, _event: &HarnessAuditEvent) {}
}
