// crates/infra-harness-core/src/interfaces/mod.rs
// ============================================================================
// Module: Infra Harness Interfaces
// Description: Collaborator contracts for provisioning and cloud facts.
// Purpose: Keep the harness independent of Terraform and cloud SDK details.
// Dependencies: crate::core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The harness consumes two external collaborators:
//! - [`Provisioner`] turns definitions into resources and tears them down;
//! - [`CloudFacts`] reports facts about provisioned resources.
//!
//! Implementations perform only the action requested of them. Guaranteed
//! teardown is enforced by the harness, not by collaborators.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::core::OutputName;
use crate::core::Scenario;
use crate::core::ScenarioId;
use crate::core::SecurityGroupFacts;
use crate::core::VarValue;
use crate::core::scenario::ENVIRONMENT_VAR;

// ============================================================================
// SECTION: Provisioning Collaborator
// ============================================================================

/// Inputs for apply and destroy requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionRequest {
    /// Scenario identifier.
    pub scenario_id: ScenarioId,
    /// Directory holding the infrastructure definitions.
    pub working_dir: PathBuf,
    /// Input variables.
    pub vars: BTreeMap<String, VarValue>,
    /// Wrap transient provider errors with the default retry policy.
    pub use_default_retryable_errors: bool,
}

impl ProvisionRequest {
    /// Builds a request from a scenario.
    ///
    /// The environment tag is passed as the `environment` variable unless the
    /// scenario already sets that variable explicitly.
    #[must_use]
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let mut vars = scenario.vars.clone();
        if !scenario.environment.is_empty() {
            vars.entry(ENVIRONMENT_VAR.to_string())
                .or_insert_with(|| VarValue::String(scenario.environment.clone()));
        }
        Self {
            scenario_id: scenario.id.clone(),
            working_dir: scenario.working_dir.clone(),
            vars,
            use_default_retryable_errors: scenario.use_default_retryable_errors,
        }
    }

    /// Returns the variables as a JSON object.
    #[must_use]
    pub fn vars_json(&self) -> Value {
        Value::Object(self.vars.iter().map(|(key, value)| (key.clone(), value.to_json())).collect())
    }
}

/// Opaque reference to a successfully provisioned environment.
///
/// # Invariants
/// - Only produced by [`Provisioner::apply`].
/// - Owned by the teardown guard and dropped before destroy is requested.
#[derive(Debug, PartialEq, Eq)]
pub struct ProvisionHandle {
    /// Scenario identifier.
    scenario_id: ScenarioId,
    /// Directory the environment was applied from.
    working_dir: PathBuf,
}

impl ProvisionHandle {
    /// Creates a handle for an applied environment.
    #[must_use]
    pub fn new(scenario_id: ScenarioId, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenario_id,
            working_dir: working_dir.into(),
        }
    }

    /// Returns the scenario identifier.
    #[must_use]
    pub const fn scenario_id(&self) -> &ScenarioId {
        &self.scenario_id
    }

    /// Returns the directory the environment was applied from.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

/// Provisioning collaborator errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    /// Apply reported non-success.
    #[error("apply failed: {0}")]
    Apply(String),
    /// Requested output does not exist.
    #[error("output not found: {0}")]
    OutputNotFound(String),
    /// Output query failed for another reason.
    #[error("output query failed: {0}")]
    Output(String),
    /// Destroy reported non-success.
    #[error("destroy failed: {0}")]
    Destroy(String),
    /// Static definition check failed.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Provisioning collaborator consumed by the harness.
pub trait Provisioner {
    /// Provisions the definitions with the given variables.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Apply`] when provisioning fails.
    fn apply(&self, request: &ProvisionRequest) -> Result<ProvisionHandle, ProvisionError>;

    /// Reads a named output from an applied environment.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::OutputNotFound`] when the name does not exist.
    fn output(&self, handle: &ProvisionHandle, name: &OutputName) -> Result<String, ProvisionError>;

    /// Destroys whatever state exists for the request, including partial state.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Destroy`] when teardown fails.
    fn destroy(&self, request: &ProvisionRequest) -> Result<(), ProvisionError>;

    /// Statically checks the definitions without provisioning anything.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Validation`] when the definitions are invalid.
    fn validate(&self, working_dir: &Path) -> Result<(), ProvisionError>;
}

impl<T: Provisioner + ?Sized> Provisioner for &T {
    fn apply(&self, request: &ProvisionRequest) -> Result<ProvisionHandle, ProvisionError> {
        (**self).apply(request)
    }

    fn output(
        &self,
        handle: &ProvisionHandle,
        name: &OutputName,
    ) -> Result<String, ProvisionError> {
        (**self).output(handle, name)
    }

    fn destroy(&self, request: &ProvisionRequest) -> Result<(), ProvisionError> {
        (**self).destroy(request)
    }

    fn validate(&self, working_dir: &Path) -> Result<(), ProvisionError> {
        (**self).validate(working_dir)
    }
}

// ============================================================================
// SECTION: Cloud-Fact Collaborator
// ============================================================================

/// Cloud-fact collaborator errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactsError {
    /// The resource does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),
    /// The cloud API reported an error.
    #[error("cloud facts provider error: {0}")]
    Provider(String),
    /// No collaborator is configured.
    #[error("cloud facts are not configured")]
    Unavailable,
}

/// Cloud-fact collaborator consumed by the harness.
pub trait CloudFacts {
    /// Looks up a security group inside a VPC.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError`] when the group cannot be resolved.
    fn security_group(&self, group_id: &str, vpc_id: &str)
    -> Result<SecurityGroupFacts, FactsError>;
}

impl<T: CloudFacts + ?Sized> CloudFacts for &T {
    fn security_group(
        &self,
        group_id: &str,
        vpc_id: &str,
    ) -> Result<SecurityGroupFacts, FactsError> {
        (**self).security_group(group_id, vpc_id)
    }
}

/// Placeholder collaborator for scenarios without fact checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCloudFacts;

impl CloudFacts for NoCloudFacts {
    fn security_group(
        &self,
        _group_id: &str,
        _vpc_id: &str,
    ) -> Result<SecurityGroupFacts, FactsError> {
        Err(FactsError::Unavailable)
    }
}
