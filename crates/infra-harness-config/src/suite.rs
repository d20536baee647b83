// crates/infra-harness-config/src/suite.rs
// ============================================================================
// Module: Suite Configuration
// Description: Suite file loading and validation.
// Purpose: Provide strict, fail-closed suite parsing with hard limits.
// Dependencies: infra-harness-core, serde, toml
// ============================================================================

//! ## Overview
//! A suite file is TOML with an optional `[harness]` table and one or more
//! `[[scenario]]` tables. Relative scenario working directories are resolved
//! against the directory containing the suite file, so suites can live next
//! to the infrastructure definitions they exercise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use infra_harness_core::Scenario;
use infra_harness_core::ScenarioId;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::env::EnvOverrides;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default suite filename when no path is specified.
pub const DEFAULT_SUITE_NAME: &str = "infra-harness.toml";
/// Default provisioning binary name, resolved through `PATH`.
pub const DEFAULT_TERRAFORM_BINARY: &str = "terraform";
/// Maximum suite file size in bytes.
pub(crate) const MAX_SUITE_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of scenarios in one suite.
pub(crate) const MAX_SCENARIOS: usize = 256;

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Parsed suite file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    /// Runner settings.
    #[serde(default)]
    pub harness: HarnessSettings,
    /// Scenario definitions in file order.
    #[serde(default, rename = "scenario")]
    pub scenarios: Vec<Scenario>,
    /// Path the suite was loaded from (not serialized).
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl SuiteConfig {
    /// Loads, resolves, and validates a suite file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when reading, parsing, or validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_SUITE_FILE_SIZE {
            return Err(ConfigError::Invalid("suite file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("suite file must be utf-8".to_string()))?;
        let mut suite = Self::parse(content)?;
        if let Some(base) = path.parent() {
            suite.resolve_relative_to(base);
        }
        suite.source = Some(path.to_path_buf());
        suite.validate()?;
        Ok(suite)
    }

    /// Parses suite TOML without resolving paths or validating.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML does not match the model.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Resolves relative scenario working directories against `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for scenario in &mut self.scenarios {
            if scenario.working_dir.is_relative() && !scenario.working_dir.as_os_str().is_empty() {
                scenario.working_dir = base.join(&scenario.working_dir);
            }
        }
    }

    /// Validates the suite for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the suite is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.harness.validate()?;
        if self.scenarios.is_empty() {
            return Err(ConfigError::Invalid("suite must define at least one scenario".to_string()));
        }
        if self.scenarios.len() > MAX_SCENARIOS {
            return Err(ConfigError::Invalid(format!(
                "suite defines {} scenarios (max {MAX_SCENARIOS})",
                self.scenarios.len()
            )));
        }
        let mut seen = BTreeSet::new();
        for scenario in &self.scenarios {
            scenario.validate().map_err(|err| ConfigError::Invalid(err.to_string()))?;
            validate_path_string(
                &format!("scenario {} working_dir", scenario.id),
                &scenario.working_dir.to_string_lossy(),
            )?;
            if !seen.insert(scenario.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate scenario id: {}", scenario.id)));
            }
        }
        Ok(())
    }

    /// Returns the scenario with the given id.
    #[must_use]
    pub fn scenario(&self, id: &ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|scenario| &scenario.id == id)
    }

    /// Selects scenarios by id, preserving suite order. An empty selection
    /// returns every scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a requested id is not defined.
    pub fn select(&self, ids: &[ScenarioId]) -> Result<Vec<&Scenario>, ConfigError> {
        if let Some(unknown) = ids.iter().find(|id| self.scenario(id).is_none()) {
            return Err(ConfigError::Invalid(format!("unknown scenario: {unknown}")));
        }
        Ok(self
            .scenarios
            .iter()
            .filter(|scenario| ids.is_empty() || ids.contains(&scenario.id))
            .collect())
    }

    /// Applies environment overrides on top of file settings.
    pub fn apply_env(&mut self, overrides: &EnvOverrides) {
        if let Some(binary) = &overrides.terraform_binary {
            self.harness.terraform_binary.clone_from(binary);
        }
        if let Some(run_root) = &overrides.run_root {
            self.harness.run_root = Some(run_root.clone());
        }
        if let Some(audit_log) = &overrides.audit_log {
            self.harness.audit_log = Some(audit_log.clone());
        }
    }
}

// ============================================================================
// SECTION: Harness Settings
// ============================================================================

/// Runner settings from the `[harness]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessSettings {
    /// Provisioning binary (name on `PATH` or explicit path).
    #[serde(default = "default_terraform_binary")]
    pub terraform_binary: PathBuf,
    /// Optional JSON-lines audit log path. Audit goes to stderr when unset.
    #[serde(default)]
    pub audit_log: Option<PathBuf>,
    /// Optional root directory for run artifacts.
    #[serde(default)]
    pub run_root: Option<PathBuf>,
    /// Extra environment variables passed to every provisioning command.
    #[serde(default)]
    pub terraform_env: BTreeMap<String, String>,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            terraform_binary: default_terraform_binary(),
            audit_log: None,
            run_root: None,
            terraform_env: BTreeMap::new(),
        }
    }
}

impl HarnessSettings {
    /// Validates runner settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a setting is out of bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("harness.terraform_binary", &self.terraform_binary.to_string_lossy())?;
        if let Some(audit_log) = &self.audit_log {
            validate_path_string("harness.audit_log", &audit_log.to_string_lossy())?;
        }
        if let Some(run_root) = &self.run_root {
            validate_path_string("harness.run_root", &run_root.to_string_lossy())?;
        }
        for key in self.terraform_env.keys() {
            if key.trim().is_empty() || key.contains('=') || key.contains('\0') {
                return Err(ConfigError::Invalid(format!(
                    "harness.terraform_env key is invalid: '{key}'"
                )));
            }
        }
        Ok(())
    }
}

/// Serde default for the provisioning binary.
fn default_terraform_binary() -> PathBuf {
    PathBuf::from(DEFAULT_TERRAFORM_BINARY)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Suite configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading the suite.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Invalid environment override.
    #[error("config env error: {0}")]
    Env(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the suite path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("suite path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("suite path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
