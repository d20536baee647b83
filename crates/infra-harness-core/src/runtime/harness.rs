// crates/infra-harness-core/src/runtime/harness.rs
// ============================================================================
// Module: Infrastructure Validation Harness
// Description: Scenario runner and static definition validation.
// Purpose: Apply, read outputs, query facts, evaluate checks, always tear down.
// Dependencies: crate::{audit, core, interfaces, runtime::guard}
// ============================================================================

//! ## Overview
//! [`Harness::run_scenario`] executes one scenario:
//! 1. validate the scenario and collaborator wiring (no apply on failure);
//! 2. arm the [`TeardownGuard`] and request apply;
//! 3. read each referenced output once;
//! 4. query security group facts once per `(group, vpc)` pair;
//! 5. evaluate every check and report each result;
//! 6. tear down.
//!
//! Apply failure aborts before any output query. A missing output is a hard
//! failure. A failing check is reported on the outcome, not returned as an
//! error. If destroy fails after an earlier error, the earlier error wins and
//! the destroy failure is visible in the audit log.
//!
//! [`Harness::validate_definitions`] is stateless and never arms a guard.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::audit::HarnessAuditEvent;
use crate::audit::HarnessAuditSink;
use crate::audit::HarnessEventKind;
use crate::core::AssertionReport;
use crate::core::Check;
use crate::core::OutputName;
use crate::core::Scenario;
use crate::core::ScenarioError;
use crate::core::ScenarioId;
use crate::core::ScenarioOutcome;
use crate::core::SecurityGroupFacts;
use crate::core::TeardownStatus;
use crate::interfaces::CloudFacts;
use crate::interfaces::NoCloudFacts;
use crate::interfaces::ProvisionError;
use crate::interfaces::ProvisionHandle;
use crate::interfaces::ProvisionRequest;
use crate::interfaces::Provisioner;
use crate::runtime::assertions;
use crate::runtime::guard::TeardownGuard;

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Infrastructure validation harness bound to its collaborators.
pub struct Harness<P, F = NoCloudFacts> {
    /// Provisioning collaborator.
    provisioner: P,
    /// Optional cloud-fact collaborator.
    facts: Option<F>,
    /// Audit sink for lifecycle events.
    audit: Arc<dyn HarnessAuditSink>,
}

impl<P: Provisioner> Harness<P, NoCloudFacts> {
    /// Creates a harness without a cloud-fact collaborator.
    #[must_use]
    pub fn new(provisioner: P, audit: Arc<dyn HarnessAuditSink>) -> Self {
        Self {
            provisioner,
            facts: None,
            audit,
        }
    }
}

impl<P: Provisioner, F: CloudFacts> Harness<P, F> {
    /// Attaches a cloud-fact collaborator.
    #[must_use]
    pub fn with_cloud_facts<G: CloudFacts>(self, facts: G) -> Harness<P, G> {
        Harness {
            provisioner: self.provisioner,
            facts: Some(facts),
            audit: self.audit,
        }
    }

    /// Runs one scenario through apply, checks, and guaranteed teardown.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the scenario is invalid, apply fails, an
    /// output is missing, a fact query fails, or destroy fails. Failing checks
    /// are reported on the returned [`ScenarioOutcome`] instead.
    pub fn run_scenario(&self, scenario: &Scenario) -> Result<ScenarioOutcome, HarnessError> {
        scenario.validate()?;
        if scenario.requires_cloud_facts() && self.facts.is_none() {
            return Err(HarnessError::FactsUnavailable {
                scenario: scenario.id.clone(),
            });
        }

        let request = ProvisionRequest::from_scenario(scenario);
        self.audit.record(
            &HarnessAuditEvent::new(HarnessEventKind::ScenarioStarted)
                .scenario(&scenario.id)
                .subject(scenario.environment.clone()),
        );

        let mut guard = TeardownGuard::arm(&self.provisioner, &request, self.audit.as_ref());
        let checked = self.apply_and_check(scenario, &mut guard);
        let teardown = guard.teardown();

        let result = match (checked, teardown) {
            (Ok(mut outcome), Ok(())) => {
                outcome.teardown = TeardownStatus::Completed;
                Ok(outcome)
            }
            (Ok(_), Err(err)) => Err(HarnessError::Destroy {
                scenario: scenario.id.clone(),
                message: err.to_string(),
            }),
            (Err(err), _) => Err(err),
        };

        let finished =
            HarnessAuditEvent::new(HarnessEventKind::ScenarioFinished).scenario(&scenario.id);
        let finished = match &result {
            Ok(outcome) => finished.outcome(outcome.status.as_str()),
            Err(err) => finished.outcome("error").message(err.to_string()),
        };
        self.audit.record(&finished);
        result
    }

    /// Statically checks definitions without provisioning anything.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Validation`] when the provisioner rejects the
    /// definitions.
    pub fn validate_definitions(&self, working_dir: &Path) -> Result<(), HarnessError> {
        let result = self.provisioner.validate(working_dir);
        let event = HarnessAuditEvent::new(HarnessEventKind::ValidateCompleted)
            .subject(working_dir.display().to_string());
        let event = match &result {
            Ok(()) => event.outcome("ok"),
            Err(err) => event.outcome("error").message(err.to_string()),
        };
        self.audit.record(&event);
        result.map_err(|err| HarnessError::Validation {
            working_dir: working_dir.display().to_string(),
            message: validation_message(err),
        })
    }

    /// Steps 2 through 5: apply, read outputs, query facts, evaluate checks.
    fn apply_and_check(
        &self,
        scenario: &Scenario,
        guard: &mut TeardownGuard<'_, P>,
    ) -> Result<ScenarioOutcome, HarnessError> {
        let handle = guard.apply().map_err(|err| HarnessError::Apply {
            scenario: scenario.id.clone(),
            message: apply_message(err),
        })?;

        let outputs = self.read_outputs(scenario, handle)?;
        let mut facts_cache: BTreeMap<(String, String), SecurityGroupFacts> = BTreeMap::new();
        let mut reports = Vec::with_capacity(scenario.checks.len());
        for check in &scenario.checks {
            let report = self.evaluate_check(scenario, check, &outputs, &mut facts_cache)?;
            self.audit.record(
                &HarnessAuditEvent::new(HarnessEventKind::AssertionEvaluated)
                    .scenario(&scenario.id)
                    .subject(report.check.clone())
                    .outcome(if report.passed { "pass" } else { "fail" })
                    .message(report.message.clone()),
            );
            reports.push(report);
        }

        let outputs =
            outputs.into_iter().map(|(name, value)| (name.as_str().to_string(), value)).collect();
        Ok(ScenarioOutcome::from_reports(scenario.id.clone(), reports, outputs))
    }

    /// Reads every referenced output once.
    fn read_outputs(
        &self,
        scenario: &Scenario,
        handle: &ProvisionHandle,
    ) -> Result<BTreeMap<OutputName, String>, HarnessError> {
        let mut outputs = BTreeMap::new();
        for name in scenario.referenced_outputs() {
            let value = self.provisioner.output(handle, name).map_err(|err| match err {
                ProvisionError::OutputNotFound(_) => HarnessError::OutputNotFound {
                    scenario: scenario.id.clone(),
                    output: name.clone(),
                },
                other => HarnessError::Output {
                    scenario: scenario.id.clone(),
                    message: other.to_string(),
                },
            })?;
            self.audit.record(
                &HarnessAuditEvent::new(HarnessEventKind::OutputRead)
                    .scenario(&scenario.id)
                    .subject(name.as_str())
                    .outcome("ok"),
            );
            outputs.insert(name.clone(), value);
        }
        Ok(outputs)
    }

    /// Evaluates one check against outputs and (cached) facts.
    fn evaluate_check(
        &self,
        scenario: &Scenario,
        check: &Check,
        outputs: &BTreeMap<OutputName, String>,
        facts_cache: &mut BTreeMap<(String, String), SecurityGroupFacts>,
    ) -> Result<AssertionReport, HarnessError> {
        let label = check.label();
        let lookup = |name: &OutputName| {
            outputs.get(name).map(|value| value.trim().to_string()).ok_or_else(|| {
                HarnessError::OutputNotFound {
                    scenario: scenario.id.clone(),
                    output: name.clone(),
                }
            })
        };
        match check {
            Check::OutputNotEmpty {
                output,
            } => Ok(assertions::output_not_empty(&label, output, &lookup(output)?)),
            Check::OutputEquals {
                output,
                expected,
            } => Ok(assertions::output_equals(&label, output, &lookup(output)?, expected)),
            Check::PortOpenToCidr {
                security_group_output,
                vpc_output,
                port,
                cidr,
                expected,
            } => {
                let group_id = lookup(security_group_output)?;
                let vpc_id = lookup(vpc_output)?;
                let facts = match facts_cache.entry((group_id, vpc_id)) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => {
                        let (group_id, vpc_id) = entry.key();
                        let facts = self.query_security_group(scenario, group_id, vpc_id)?;
                        entry.insert(facts)
                    }
                };
                assertions::port_open_to_cidr(&label, facts, *port, cidr, *expected).map_err(
                    |err| {
                        HarnessError::InvalidScenario(ScenarioError::InvalidCheck {
                            scenario: scenario.id.to_string(),
                            message: err.to_string(),
                        })
                    },
                )
            }
        }
    }

    /// Queries the cloud-fact collaborator for one security group.
    fn query_security_group(
        &self,
        scenario: &Scenario,
        group_id: &str,
        vpc_id: &str,
    ) -> Result<SecurityGroupFacts, HarnessError> {
        let facts = self.facts.as_ref().ok_or_else(|| HarnessError::FactsUnavailable {
            scenario: scenario.id.clone(),
        })?;
        facts.security_group(group_id, vpc_id).map_err(|err| HarnessError::Facts {
            scenario: scenario.id.clone(),
            message: err.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Harness execution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// Scenario failed validation; nothing was provisioned.
    #[error("invalid scenario: {0}")]
    InvalidScenario(#[from] ScenarioError),
    /// Scenario has fact checks but no cloud-fact collaborator.
    #[error("scenario {scenario}: fact checks require a cloud facts collaborator")]
    FactsUnavailable {
        /// Scenario identifier.
        scenario: ScenarioId,
    },
    /// Apply failed; teardown was still requested.
    #[error("scenario {scenario}: apply failed: {message}")]
    Apply {
        /// Scenario identifier.
        scenario: ScenarioId,
        /// Provisioner detail.
        message: String,
    },
    /// A requested output does not exist.
    #[error("scenario {scenario}: output not found: {output}")]
    OutputNotFound {
        /// Scenario identifier.
        scenario: ScenarioId,
        /// Missing output name.
        output: OutputName,
    },
    /// An output query failed for another reason.
    #[error("scenario {scenario}: output query failed: {message}")]
    Output {
        /// Scenario identifier.
        scenario: ScenarioId,
        /// Provisioner detail.
        message: String,
    },
    /// A fact query failed.
    #[error("scenario {scenario}: fact query failed: {message}")]
    Facts {
        /// Scenario identifier.
        scenario: ScenarioId,
        /// Collaborator detail.
        message: String,
    },
    /// Destroy failed after an otherwise complete run.
    #[error("scenario {scenario}: destroy failed: {message}")]
    Destroy {
        /// Scenario identifier.
        scenario: ScenarioId,
        /// Provisioner detail.
        message: String,
    },
    /// Static definition check failed; nothing was provisioned.
    #[error("validation failed for {working_dir}: {message}")]
    Validation {
        /// Directory that was validated.
        working_dir: String,
        /// Provisioner detail.
        message: String,
    },
}

impl HarnessError {
    /// Returns a stable label for the error category.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidScenario(_) => "invalid_scenario",
            Self::FactsUnavailable {
                ..
            } => "facts_unavailable",
            Self::Apply {
                ..
            } => "apply_error",
            Self::OutputNotFound {
                ..
            } => "output_not_found",
            Self::Output {
                ..
            } => "output_error",
            Self::Facts {
                ..
            } => "facts_error",
            Self::Destroy {
                ..
            } => "destroy_error",
            Self::Validation {
                ..
            } => "validation_error",
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts the apply detail without repeating the category prefix.
fn apply_message(err: ProvisionError) -> String {
    match err {
        ProvisionError::Apply(message) => message,
        other => other.to_string(),
    }
}

/// Extracts the validation detail without repeating the category prefix.
fn validation_message(err: ProvisionError) -> String {
    match err {
        ProvisionError::Validation(message) => message,
        other => other.to_string(),
    }
}
