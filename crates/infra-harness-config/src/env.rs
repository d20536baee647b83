// crates/infra-harness-config/src/env.rs
// ============================================================================
// Module: Harness Environment Overrides
// Description: Environment-backed overrides for suite settings.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 and blank values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::path::PathBuf;

use crate::suite::ConfigError;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys recognized by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// Provisioning binary override.
    TerraformBinary,
    /// Run artifact root override.
    RunRoot,
    /// Audit log path override.
    AuditLog,
}

impl HarnessEnv {
    /// All recognized keys.
    pub const ALL: [Self; 3] = [Self::TerraformBinary, Self::RunRoot, Self::AuditLog];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TerraformBinary => "INFRA_HARNESS_TERRAFORM_BIN",
            Self::RunRoot => "INFRA_HARNESS_RUN_ROOT",
            Self::AuditLog => "INFRA_HARNESS_AUDIT_LOG",
        }
    }
}

// ============================================================================
// SECTION: Overrides
// ============================================================================

/// Typed overrides derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvOverrides {
    /// Provisioning binary override.
    pub terraform_binary: Option<PathBuf>,
    /// Run artifact root override.
    pub run_root: Option<PathBuf>,
    /// Audit log path override.
    pub audit_log: Option<PathBuf>,
}

impl EnvOverrides {
    /// Loads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] when a value is not valid UTF-8 or is blank.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Loads overrides through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] when a value is not valid UTF-8 or is blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let read = |key: HarnessEnv| {
            read_env_nonempty(key.as_str(), lookup(key.as_str()))
                .map(|value| value.map(PathBuf::from))
                .map_err(ConfigError::Env)
        };
        Ok(Self {
            terraform_binary: read(HarnessEnv::TerraformBinary)?,
            run_root: read(HarnessEnv::RunRoot)?,
            audit_log: read(HarnessEnv::AuditLog)?,
        })
    }

    /// Returns true when no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.terraform_binary.is_none() && self.run_root.is_none() && self.audit_log.is_none()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    decode(name, std::env::var_os(name))
}

/// Converts a raw value to UTF-8.
fn decode(name: &str, raw: Option<OsString>) -> Result<Option<String>, String> {
    raw.map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Converts a raw value to UTF-8 and rejects blank values.
fn read_env_nonempty(name: &str, raw: Option<OsString>) -> Result<Option<String>, String> {
    match decode(name, raw)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}
