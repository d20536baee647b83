// crates/infra-harness-terraform/src/provisioner.rs
// ============================================================================
// Module: Terraform Provisioner
// Description: Provisioner implementation backed by the terraform CLI.
// Purpose: Map apply/output/destroy/validate onto terraform subcommands.
// Dependencies: infra-harness-core, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Command sequence per operation:
//! - apply: `init -input=false -no-color -upgrade=false`, then
//!   `apply -input=false -auto-approve -no-color -lock=false -var-file=<json>`
//! - output: `output -no-color -json <name>`
//! - destroy: `destroy -input=false -auto-approve -no-color -lock=false -var-file=<json>`
//! - validate: `init -backend=false -input=false -no-color`, then `validate -no-color`
//!
//! Init, apply, and destroy honor the request's retryable-error flag. Output
//! and validate never retry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use infra_harness_core::OutputName;
use infra_harness_core::ProvisionError;
use infra_harness_core::ProvisionHandle;
use infra_harness_core::ProvisionRequest;
use infra_harness_core::Provisioner;
use serde_json::Value;
use tempfile::TempDir;

use crate::command::CommandOutput;
use crate::command::TerraformCli;
use crate::command::TerraformError;
use crate::retry::RetryPolicy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the generated variable file.
const VAR_FILE_NAME: &str = "harness.tfvars.json";
/// Fragments terraform prints when an output is not defined.
const MISSING_OUTPUT_MARKERS: &[&str] =
    &["not found", "could not be found", "no outputs found", "output variable requested"];

// ============================================================================
// SECTION: Provisioner
// ============================================================================

/// Provisioner that shells out to `terraform`.
#[derive(Debug, Clone)]
pub struct TerraformProvisioner {
    /// Command runner.
    cli: TerraformCli,
    /// Policy used when a request enables default retryable errors.
    retry: RetryPolicy,
}

impl TerraformProvisioner {
    /// Creates a provisioner for `binary` with the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::Pattern`] when the default patterns fail to
    /// compile.
    pub fn new(binary: impl Into<PathBuf>) -> Result<Self, TerraformError> {
        Ok(Self {
            cli: TerraformCli::new(binary),
            retry: RetryPolicy::default_retryable()?,
        })
    }

    /// Adds an environment variable to every terraform invocation.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cli = self.cli.with_env(key, value);
        self
    }

    /// Replaces the policy used for retry-enabled requests.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the command runner.
    #[must_use]
    pub const fn cli(&self) -> &TerraformCli {
        &self.cli
    }

    /// Runs one subcommand under the request's retry policy.
    fn run_for(
        &self,
        request: &ProvisionRequest,
        args: &[&str],
    ) -> Result<CommandOutput, TerraformError> {
        let none = RetryPolicy::none();
        let policy = if request.use_default_retryable_errors { &self.retry } else { &none };
        let (result, attempts) = policy.run(|| self.cli.run(&request.working_dir, args));
        result.map_err(|err| {
            if attempts > 1 {
                TerraformError::RetriesExhausted {
                    attempts,
                    source: Box::new(err),
                }
            } else {
                err
            }
        })
    }
}

impl Provisioner for TerraformProvisioner {
    fn apply(&self, request: &ProvisionRequest) -> Result<ProvisionHandle, ProvisionError> {
        let var_file =
            VarFile::write(request).map_err(|err| ProvisionError::Apply(err.to_string()))?;
        self.run_for(request, &["init", "-input=false", "-no-color", "-upgrade=false"])
            .map_err(|err| ProvisionError::Apply(err.to_string()))?;
        let var_arg = var_file.arg();
        self.run_for(request, &[
            "apply",
            "-input=false",
            "-auto-approve",
            "-no-color",
            "-lock=false",
            var_arg.as_str(),
        ])
        .map_err(|err| ProvisionError::Apply(err.to_string()))?;
        Ok(ProvisionHandle::new(request.scenario_id.clone(), request.working_dir.clone()))
    }

    fn output(
        &self,
        handle: &ProvisionHandle,
        name: &OutputName,
    ) -> Result<String, ProvisionError> {
        let result =
            self.cli.run(handle.working_dir(), &["output", "-no-color", "-json", name.as_str()]);
        match result {
            Ok(output) => decode_output(&output.stdout)
                .map_err(|err| ProvisionError::Output(format!("{name}: {err}"))),
            Err(err) if is_missing_output(&err) => {
                Err(ProvisionError::OutputNotFound(name.to_string()))
            }
            Err(err) => Err(ProvisionError::Output(err.to_string())),
        }
    }

    fn destroy(&self, request: &ProvisionRequest) -> Result<(), ProvisionError> {
        let var_file =
            VarFile::write(request).map_err(|err| ProvisionError::Destroy(err.to_string()))?;
        let var_arg = var_file.arg();
        self.run_for(request, &[
            "destroy",
            "-input=false",
            "-auto-approve",
            "-no-color",
            "-lock=false",
            var_arg.as_str(),
        ])
        .map(|_| ())
        .map_err(|err| ProvisionError::Destroy(err.to_string()))
    }

    fn validate(&self, working_dir: &Path) -> Result<(), ProvisionError> {
        if !working_dir.is_dir() {
            return Err(ProvisionError::Validation(format!(
                "{} is not a directory",
                working_dir.display()
            )));
        }
        self.cli
            .run(working_dir, &["init", "-backend=false", "-input=false", "-no-color"])
            .and_then(|_| self.cli.run(working_dir, &["validate", "-no-color"]))
            .map(|_| ())
            .map_err(|err| ProvisionError::Validation(err.to_string()))
    }
}

// ============================================================================
// SECTION: Var File
// ============================================================================

/// JSON variable file in a private temp directory, removed on drop.
struct VarFile {
    /// Owning directory.
    _dir: TempDir,
    /// Absolute path of the file.
    path: PathBuf,
}

impl VarFile {
    /// Writes the request's variables.
    fn write(request: &ProvisionRequest) -> Result<Self, TerraformError> {
        let dir = tempfile::Builder::new()
            .prefix("infra-harness-vars-")
            .tempdir()
            .map_err(|err| TerraformError::VarFile(err.to_string()))?;
        let path = dir.path().join(VAR_FILE_NAME);
        let body = serde_json::to_vec_pretty(&request.vars_json())
            .map_err(|err| TerraformError::VarFile(err.to_string()))?;
        fs::write(&path, body).map_err(|err| TerraformError::VarFile(err.to_string()))?;
        Ok(Self {
            _dir: dir,
            path,
        })
    }

    /// Returns the `-var-file=` argument.
    fn arg(&self) -> String {
        format!("-var-file={}", self.path.display())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts `terraform output -json` text to a plain value. Strings are
/// unquoted, null becomes empty, and other values stay compact JSON.
fn decode_output(stdout: &str) -> Result<String, TerraformError> {
    let value: Value = serde_json::from_str(stdout.trim())
        .map_err(|err| TerraformError::OutputDecode(err.to_string()))?;
    Ok(match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Returns true when a failed `output` call reports an undefined output.
fn is_missing_output(err: &TerraformError) -> bool {
    err.output().is_some_and(|output| {
        let lower = output.to_ascii_lowercase();
        MISSING_OUTPUT_MARKERS.iter().any(|marker| lower.contains(marker))
    })
}
