// crates/infra-harness-cli/tests/common/mod.rs
// =============================================================================
// Module: CLI Test Fixtures
// Description: Fake terraform installs and suite files for binary tests.
// Purpose: Run the infra-harness binary end to end without cloud access.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;

use tempfile::TempDir;

/// Fake terraform that logs invocations to `$FAKE_TF_DIR/calls.log`.
///
/// `apply` fails when `$FAKE_TF_DIR/apply_denied` exists and `validate`
/// fails when `$FAKE_TF_DIR/invalid` exists.
const FAKE_TERRAFORM: &str = r#"#!/bin/sh
echo "$*" >> "$FAKE_TF_DIR/calls.log"
case "$1" in
  init) exit 0 ;;
  apply)
    if [ -f "$FAKE_TF_DIR/apply_denied" ]; then
      echo "Error: creating EC2 Instance: UnauthorizedOperation" >&2
      exit 1
    fi
    echo "Apply complete! Resources: 9 added, 0 changed, 0 destroyed."
    ;;
  output)
    case "$4" in
      kafka_consumer_public_ip) echo '"54.210.10.20"' ;;
      *)
        echo "Error: Output \"$4\" not found" >&2
        exit 1
        ;;
    esac
    ;;
  destroy) echo "Destroy complete! Resources: 9 destroyed." ;;
  validate)
    if [ -f "$FAKE_TF_DIR/invalid" ]; then
      echo "Error: Unsupported argument" >&2
      exit 1
    fi
    echo "Success! The configuration is valid."
    ;;
  *) exit 2 ;;
esac
"#;

/// Serializes tests that write and execute scripts (avoids ETXTBSY races).
pub fn script_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|poison| poison.into_inner())
}

/// Path to the compiled CLI binary.
pub fn infra_harness_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_infra-harness"))
}

/// Temp workspace with a fake terraform, a module directory, and a suite.
pub struct Workspace {
    /// Holds every file for the test.
    pub root: TempDir,
    /// Path to the fake binary.
    pub binary: PathBuf,
    /// Suite file path.
    pub suite: PathBuf,
}

impl Workspace {
    /// Installs the fake binary and writes a two-scenario suite.
    pub fn new() -> Result<Self, String> {
        let root = tempfile::tempdir().map_err(|err| err.to_string())?;
        let binary = root.path().join("terraform");
        fs::write(&binary, FAKE_TERRAFORM).map_err(|err| err.to_string())?;
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))
            .map_err(|err| err.to_string())?;
        fs::create_dir(root.path().join("terraform-module")).map_err(|err| err.to_string())?;
        let suite = root.path().join("infra-harness.toml");
        let workspace = Self {
            root,
            binary,
            suite,
        };
        workspace.write_suite(&workspace.suite_text())?;
        Ok(workspace)
    }

    /// Returns the standard suite text pointing at the fake binary.
    pub fn suite_text(&self) -> String {
        format!(
            r#"
[harness]
terraform_binary = "{binary}"
audit_log = "{audit}"
run_root = "{runs}"

[harness.terraform_env]
FAKE_TF_DIR = "{state}"

[[scenario]]
id = "infrastructure"
working_dir = "terraform-module"
environment = "test"
use_default_retryable_errors = true
[scenario.vars]
aws_region = "us-east-1"
instance_type = "t3.micro"
[[scenario.check]]
kind = "output_not_empty"
output = "kafka_consumer_public_ip"

[[scenario]]
id = "variables"
working_dir = "terraform-module"
environment = "test"
[scenario.vars]
aws_region = "us-west-2"
vpc_cidr = "172.16.0.0/16"
subnet_cidr = "172.16.1.0/24"
[[scenario.check]]
kind = "output_not_empty"
output = "kafka_consumer_public_ip"
"#,
            binary = self.binary.display(),
            audit = self.audit_log().display(),
            runs = self.run_root().display(),
            state = self.root.path().display(),
        )
    }

    /// Overwrites the suite file.
    pub fn write_suite(&self, content: &str) -> Result<(), String> {
        fs::write(&self.suite, content).map_err(|err| err.to_string())
    }

    /// Creates a marker file that toggles fake behavior.
    pub fn set_flag(&self, name: &str) -> Result<(), String> {
        fs::write(self.root.path().join(name), "").map_err(|err| err.to_string())
    }

    /// Audit log path configured in the suite.
    pub fn audit_log(&self) -> PathBuf {
        self.root.path().join("audit").join("audit.jsonl")
    }

    /// Run root configured in the suite.
    pub fn run_root(&self) -> PathBuf {
        self.root.path().join("runs")
    }

    /// Module directory referenced by the suite.
    pub fn module_dir(&self) -> PathBuf {
        self.root.path().join("terraform-module")
    }

    /// Returns the logged terraform invocations.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.root.path().join("calls.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Returns the single `summary.json` written under the run root.
    pub fn summary(&self) -> Result<serde_json::Value, String> {
        let run_dir = single_entry(&self.run_root())?;
        let raw =
            fs::read_to_string(run_dir.join("summary.json")).map_err(|err| err.to_string())?;
        serde_json::from_str(&raw).map_err(|err| err.to_string())
    }

    /// Runs the CLI with `args`, isolated from the caller's overrides.
    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("spawn infra-harness")
    }

    /// Builds a CLI command with a scrubbed override environment.
    pub fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(infra_harness_bin());
        command
            .args(args)
            .current_dir(self.root.path())
            .env("FAKE_TF_DIR", self.root.path())
            .env_remove("INFRA_HARNESS_TERRAFORM_BIN")
            .env_remove("INFRA_HARNESS_RUN_ROOT")
            .env_remove("INFRA_HARNESS_AUDIT_LOG");
        command
    }
}

/// Returns the only entry in `dir`.
fn single_entry(dir: &Path) -> Result<PathBuf, String> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|err| err.to_string())?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    match entries.as_slice() {
        [entry] => Ok(entry.clone()),
        other => Err(format!("expected one run directory, found {}", other.len())),
    }
}
