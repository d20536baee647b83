// crates/infra-harness-core/src/core/scenario.rs
// ============================================================================
// Module: Scenario Declarations
// Description: Scenario inputs, variable values, and declarative checks.
// Purpose: Describe one infrastructure test case independent of any backend.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Scenario`] names a directory of infrastructure definitions, the
//! variables passed to the provisioning collaborator, an environment tag, and
//! the ordered [`Check`] list evaluated after apply.
//!
//! Invariants:
//! - Check order is preserved; outputs are read once each in first-use order.
//! - Variables serialize as Terraform-compatible JSON values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;

use crate::core::facts::CidrBlock;
use crate::core::identifiers::OutputName;
use crate::core::identifiers::ScenarioId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Variable key holding the cloud region for a scenario.
pub const REGION_VAR: &str = "aws_region";
/// Variable key that receives the scenario environment tag.
pub const ENVIRONMENT_VAR: &str = "environment";

// ============================================================================
// SECTION: Variable Values
// ============================================================================

/// Input variable value passed to the provisioning collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// String value.
    String(String),
    /// List of strings.
    List(Vec<String>),
    /// Nested string map (for example resource tags).
    Map(BTreeMap<String, String>),
}

impl VarValue {
    /// Converts the value into its JSON form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(value) => Value::Bool(*value),
            Self::Number(value) => Value::Number(value.clone()),
            Self::String(value) => Value::String(value.clone()),
            Self::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                    .collect(),
            ),
        }
    }

    /// Returns the string payload when the value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<BTreeMap<String, String>> for VarValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self::Map(value)
    }
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Declarative assertion evaluated after a successful apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Check {
    /// The named output must be present and non-blank.
    OutputNotEmpty {
        /// Output to read.
        output: OutputName,
    },
    /// The named output must equal an expected string.
    OutputEquals {
        /// Output to read.
        output: OutputName,
        /// Expected value.
        expected: String,
    },
    /// Whether the security group allows a port from a CIDR must match `expected`.
    PortOpenToCidr {
        /// Output holding the security group identifier.
        security_group_output: OutputName,
        /// Output holding the VPC identifier.
        vpc_output: OutputName,
        /// Port to probe.
        port: u16,
        /// Source CIDR to probe.
        cidr: String,
        /// Expected reachability.
        #[serde(default = "default_expected")]
        expected: bool,
    },
}

/// Port checks expect the port to be open unless stated otherwise.
const fn default_expected() -> bool {
    true
}

impl Check {
    /// Returns a stable human-readable label for reports.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::OutputNotEmpty {
                output,
            } => format!("output_not_empty({output})"),
            Self::OutputEquals {
                output,
                expected,
            } => format!("output_equals({output}, {expected})"),
            Self::PortOpenToCidr {
                security_group_output,
                port,
                cidr,
                expected,
                ..
            } => {
                format!("port_open_to_cidr({security_group_output}, {port}, {cidr}) == {expected}")
            }
        }
    }

    /// Returns the outputs this check reads, in evaluation order.
    #[must_use]
    pub fn outputs(&self) -> Vec<&OutputName> {
        match self {
            Self::OutputNotEmpty {
                output,
            }
            | Self::OutputEquals {
                output,
                ..
            } => vec![output],
            Self::PortOpenToCidr {
                security_group_output,
                vpc_output,
                ..
            } => vec![security_group_output, vpc_output],
        }
    }

    /// Returns true when the check needs the cloud-fact collaborator.
    #[must_use]
    pub const fn needs_cloud_facts(&self) -> bool {
        matches!(self, Self::PortOpenToCidr { .. })
    }
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// One infrastructure test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Scenario identifier.
    pub id: ScenarioId,
    /// Directory holding the infrastructure definitions.
    pub working_dir: PathBuf,
    /// Environment tag (for example `test`).
    #[serde(default)]
    pub environment: String,
    /// Input variables passed to apply and destroy.
    #[serde(default)]
    pub vars: BTreeMap<String, VarValue>,
    /// Wrap transient provider errors with the default retry policy.
    #[serde(default)]
    pub use_default_retryable_errors: bool,
    /// Checks evaluated after apply, in order.
    #[serde(default, alias = "check")]
    pub checks: Vec<Check>,
}

impl Scenario {
    /// Creates a scenario with no variables or checks.
    #[must_use]
    pub fn new(id: impl Into<ScenarioId>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            working_dir: working_dir.into(),
            environment: String::new(),
            vars: BTreeMap::new(),
            use_default_retryable_errors: false,
            checks: Vec::new(),
        }
    }

    /// Sets the environment tag.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Adds or replaces an input variable.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<VarValue>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Enables or disables the default retryable-error policy.
    #[must_use]
    pub const fn with_default_retryable_errors(mut self, enabled: bool) -> Self {
        self.use_default_retryable_errors = enabled;
        self
    }

    /// Appends a check.
    #[must_use]
    pub fn with_check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Returns the region variable when present.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.vars.get(REGION_VAR).and_then(VarValue::as_str)
    }

    /// Returns every output referenced by checks, deduplicated in first-use order.
    #[must_use]
    pub fn referenced_outputs(&self) -> Vec<&OutputName> {
        let mut seen: Vec<&OutputName> = Vec::new();
        for name in self.checks.iter().flat_map(Check::outputs) {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }

    /// Returns true when any check needs the cloud-fact collaborator.
    #[must_use]
    pub fn requires_cloud_facts(&self) -> bool {
        self.checks.iter().any(Check::needs_cloud_facts)
    }

    /// Validates the scenario for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] when identifiers are blank or a check is malformed.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ScenarioError::EmptyId);
        }
        if self.working_dir.as_os_str().is_empty() {
            return Err(ScenarioError::EmptyWorkingDir(self.id.to_string()));
        }
        if self.vars.keys().any(|key| key.trim().is_empty()) {
            return Err(ScenarioError::EmptyVariableName(self.id.to_string()));
        }
        for check in &self.checks {
            if check.outputs().iter().any(|name| name.as_str().trim().is_empty()) {
                return Err(ScenarioError::EmptyOutputName(self.id.to_string()));
            }
            if let Check::PortOpenToCidr {
                cidr,
                ..
            } = check
            {
                cidr.parse::<CidrBlock>().map_err(|err| ScenarioError::InvalidCheck {
                    scenario: self.id.to_string(),
                    message: err.to_string(),
                })?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Scenario validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    /// Scenario identifier is blank.
    #[error("scenario id must not be empty")]
    EmptyId,
    /// Working directory is empty.
    #[error("scenario {0}: working_dir must not be empty")]
    EmptyWorkingDir(String),
    /// A variable name is blank.
    #[error("scenario {0}: variable names must not be empty")]
    EmptyVariableName(String),
    /// A check references a blank output name.
    #[error("scenario {0}: output names must not be empty")]
    EmptyOutputName(String),
    /// A check carries invalid parameters.
    #[error("scenario {scenario}: invalid check: {message}")]
    InvalidCheck {
        /// Scenario identifier.
        scenario: String,
        /// Failure detail.
        message: String,
    },
}
