// crates/infra-harness-cli/src/runner.rs
// ============================================================================
// Module: Suite Runner
// Description: Wires suite settings to collaborators and runs scenarios.
// Purpose: Keep command dispatch thin and the run loop testable.
// Dependencies: infra-harness-aws, infra-harness-config, infra-harness-core,
//               infra-harness-terraform
// ============================================================================

//! ## Overview
//! [`SuiteRunner`] runs selected scenarios one at a time, each through its own
//! [`Harness`]. Scenarios with port checks get a cloud-fact collaborator from
//! the runner's factory (EC2 in the region named by the scenario); other
//! scenarios never touch cloud APIs. A scenario that errors does not stop the
//! remaining scenarios.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use infra_harness_aws::Ec2CloudFacts;
use infra_harness_aws::Ec2CloudFactsConfig;
use infra_harness_config::HarnessSettings;
use infra_harness_core::CloudFacts;
use infra_harness_core::FactsError;
use infra_harness_core::Harness;
use infra_harness_core::HarnessAuditSink;
use infra_harness_core::HarnessFileAuditSink;
use infra_harness_core::HarnessStderrAuditSink;
use infra_harness_core::Provisioner;
use infra_harness_core::Scenario;
use infra_harness_terraform::TerraformError;
use infra_harness_terraform::TerraformProvisioner;
use thiserror::Error;

use crate::report::ScenarioSummary;
use crate::report::now_millis;

// ============================================================================
// SECTION: Collaborator Wiring
// ============================================================================

/// Builds cloud-fact collaborators for scenarios that need them.
pub type FactsFactory = dyn Fn(&Scenario) -> Result<Box<dyn CloudFacts>, FactsError>;

/// Returns the audit sink selected by the settings.
///
/// # Errors
///
/// Returns [`RunnerError::Audit`] when the audit log cannot be opened.
pub fn audit_sink(settings: &HarnessSettings) -> Result<Arc<dyn HarnessAuditSink>, RunnerError> {
    match &settings.audit_log {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|err| RunnerError::Audit {
                    path: path.clone(),
                    message: err.to_string(),
                })?;
            }
            let sink = HarnessFileAuditSink::new(path).map_err(|err| RunnerError::Audit {
                path: path.clone(),
                message: err.to_string(),
            })?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(HarnessStderrAuditSink)),
    }
}

/// Returns a terraform provisioner configured from the settings.
///
/// # Errors
///
/// Returns [`RunnerError::Provisioner`] when the retry patterns fail to
/// compile.
pub fn terraform_provisioner(
    settings: &HarnessSettings,
) -> Result<TerraformProvisioner, RunnerError> {
    let provisioner =
        TerraformProvisioner::new(&settings.terraform_binary).map_err(RunnerError::Provisioner)?;
    Ok(settings
        .terraform_env
        .iter()
        .fold(provisioner, |provisioner, (key, value)| provisioner.with_env(key, value)))
}

/// Builds an EC2 collaborator in the scenario's region.
///
/// # Errors
///
/// Returns [`FactsError`] when the AWS client cannot be created.
pub fn ec2_facts(scenario: &Scenario) -> Result<Box<dyn CloudFacts>, FactsError> {
    let facts = Ec2CloudFacts::new(&Ec2CloudFactsConfig::for_scenario(scenario))?;
    Ok(Box::new(facts))
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs scenarios against one provisioner and audit sink.
pub struct SuiteRunner<P> {
    /// Provisioning collaborator shared by every scenario.
    provisioner: P,
    /// Audit sink shared by every scenario.
    audit: Arc<dyn HarnessAuditSink>,
    /// Cloud-fact collaborator factory.
    facts: Box<FactsFactory>,
}

impl<P: Provisioner> SuiteRunner<P> {
    /// Creates a runner that resolves cloud facts through EC2.
    #[must_use]
    pub fn new(provisioner: P, audit: Arc<dyn HarnessAuditSink>) -> Self {
        Self {
            provisioner,
            audit,
            facts: Box::new(ec2_facts),
        }
    }

    /// Replaces the cloud-fact collaborator factory.
    #[must_use]
    pub fn with_facts_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Scenario) -> Result<Box<dyn CloudFacts>, FactsError> + 'static,
    {
        self.facts = Box::new(factory);
        self
    }

    /// Runs one scenario and summarizes the result.
    #[must_use]
    pub fn run_scenario(&self, scenario: &Scenario) -> ScenarioSummary {
        let started = now_millis();
        let harness = Harness::new(&self.provisioner, Arc::clone(&self.audit));
        let result = if scenario.requires_cloud_facts() {
            match (self.facts)(scenario) {
                Ok(facts) => harness.with_cloud_facts(facts.as_ref()).run_scenario(scenario),
                Err(err) => {
                    return ScenarioSummary::errored(
                        scenario.id.clone(),
                        "facts_error",
                        format!("cloud facts unavailable: {err}"),
                        now_millis().saturating_sub(started),
                    );
                }
            }
        } else {
            harness.run_scenario(scenario)
        };
        let elapsed = now_millis().saturating_sub(started);
        match result {
            Ok(outcome) => ScenarioSummary::from_outcome(outcome, elapsed),
            Err(err) => ScenarioSummary::from_error(scenario.id.clone(), &err, elapsed),
        }
    }

    /// Statically validates the definitions behind each scenario.
    ///
    /// Scenarios sharing a working directory validate it once; later ones
    /// reuse the first result.
    #[must_use]
    pub fn validate_scenarios(&self, scenarios: &[&Scenario]) -> Vec<ScenarioSummary> {
        let harness = Harness::new(&self.provisioner, Arc::clone(&self.audit));
        let mut results: BTreeMap<PathBuf, Result<(), String>> = BTreeMap::new();
        let mut summaries = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let started = now_millis();
            let result = results
                .entry(scenario.working_dir.clone())
                .or_insert_with_key(|dir| {
                    harness.validate_definitions(dir).map_err(|err| err.to_string())
                })
                .clone();
            let elapsed = now_millis().saturating_sub(started);
            summaries.push(match result {
                Ok(()) => ScenarioSummary::validated(scenario.id.clone(), elapsed),
                Err(message) => ScenarioSummary::errored(
                    scenario.id.clone(),
                    "validation_error",
                    message,
                    elapsed,
                ),
            });
        }
        summaries
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while wiring collaborators.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Audit log could not be opened.
    #[error("failed to open audit log {}: {message}", path.display())]
    Audit {
        /// Audit log path.
        path: PathBuf,
        /// I/O detail.
        message: String,
    },
    /// Provisioner could not be configured.
    #[error("failed to configure provisioner: {0}")]
    Provisioner(TerraformError),
}
