// crates/infra-harness-terraform/src/command.rs
// ============================================================================
// Module: Terraform Command Runner
// Description: Blocking invocation of the terraform binary.
// Purpose: Run one terraform subcommand non-interactively and capture output.
// Dependencies: std, thiserror
// ============================================================================

//! ## Overview
//! Every invocation runs with `TF_IN_AUTOMATION=1` and `TF_INPUT=0`, a null
//! stdin, and captured stdout/stderr. There is no timeout: a hung provider
//! blocks the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum bytes of command output kept in error messages.
const MAX_ERROR_DETAIL_BYTES: usize = 4096;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Captured output of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output (lossy UTF-8).
    pub stdout: String,
    /// Standard error (lossy UTF-8).
    pub stderr: String,
}

/// Terraform binary plus the environment every invocation receives.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    /// Binary name or path.
    binary: PathBuf,
    /// Extra environment variables.
    env: BTreeMap<String, String>,
}

impl TerraformCli {
    /// Creates a runner for the given binary.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            env: BTreeMap::new(),
        }
    }

    /// Adds an environment variable to every invocation.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Returns the configured binary.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Runs `terraform <args>` inside `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::Spawn`] when the binary cannot be started and
    /// [`TerraformError::Failed`] when it exits unsuccessfully.
    pub fn run(&self, working_dir: &Path, args: &[&str]) -> Result<CommandOutput, TerraformError> {
        let command = args.first().copied().unwrap_or_default().to_string();
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(working_dir)
            .env("TF_IN_AUTOMATION", "1")
            .env("TF_INPUT", "0")
            .envs(&self.env)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| TerraformError::Spawn {
                binary: self.binary.display().to_string(),
                message: err.to_string(),
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if output.status.success() {
            return Ok(CommandOutput {
                stdout,
                stderr,
            });
        }
        let status = output
            .status
            .code()
            .map_or_else(|| "terminated by signal".to_string(), |code| format!("exit code {code}"));
        let combined = if stdout.trim().is_empty() {
            stderr
        } else {
            format!("{stdout}\n{stderr}")
        };
        Err(TerraformError::Failed {
            command,
            status,
            detail: tail(combined.trim(), MAX_ERROR_DETAIL_BYTES).to_string(),
            output: combined,
        })
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Terraform invocation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerraformError {
    /// The binary could not be started.
    #[error("failed to start {binary}: {message}")]
    Spawn {
        /// Binary name or path.
        binary: String,
        /// OS error detail.
        message: String,
    },
    /// The command exited unsuccessfully.
    #[error("terraform {command} failed ({status}): {detail}")]
    Failed {
        /// Subcommand (`init`, `apply`, ...).
        command: String,
        /// Exit status description.
        status: String,
        /// Trailing portion of the output.
        detail: String,
        /// Combined stdout and stderr.
        output: String,
    },
    /// The command failed after exhausting retries.
    #[error("{source} (after {attempts} attempts)")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Last failure.
        source: Box<Self>,
    },
    /// The variable file could not be written.
    #[error("var file error: {0}")]
    VarFile(String),
    /// A retryable-error pattern failed to compile.
    #[error("invalid retryable error pattern: {0}")]
    Pattern(String),
    /// Output JSON could not be decoded.
    #[error("output decode error: {0}")]
    OutputDecode(String),
}

impl TerraformError {
    /// Returns the combined command output when the command ran.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Failed {
                output,
                ..
            } => Some(output),
            Self::RetriesExhausted {
                source,
                ..
            } => source.output(),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns at most the last `max` bytes of `text`, on a char boundary.
fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start ..]
}
