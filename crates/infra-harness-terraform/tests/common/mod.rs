// crates/infra-harness-terraform/tests/common/mod.rs
// =============================================================================
// Module: Fake Terraform Fixtures
// Description: Shell-script stand-ins for the terraform binary.
// Purpose: Exercise the CLI provisioner without cloud credentials.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;

use tempfile::TempDir;

/// Fake terraform that logs invocations to `$FAKE_TF_DIR/calls.log`.
///
/// - `apply` copies the var file to `$FAKE_TF_DIR/vars.json` and fails with a
///   transient registry error until `$FAKE_TF_DIR/apply_failures` attempts
///   have been made.
/// - `output` answers `kafka_consumer_public_ip`, `vpc_id`, `tags`, and
///   `nothing`; other names fail with terraform's missing-output message.
/// - `validate` fails when `$FAKE_TF_DIR/invalid` exists.
/// - `destroy` fails when `$FAKE_TF_DIR/destroy_fails` exists.
const FAKE_TERRAFORM: &str = r#"#!/bin/sh
echo "$*" >> "$FAKE_TF_DIR/calls.log"
echo "TF_IN_AUTOMATION=$TF_IN_AUTOMATION TF_INPUT=$TF_INPUT" > "$FAKE_TF_DIR/env.log"
for arg in "$@"; do
  case "$arg" in
    -var-file=*) cp "${arg#-var-file=}" "$FAKE_TF_DIR/vars.json" ;;
  esac
done
case "$1" in
  init)
    exit 0
    ;;
  apply)
    n=$(cat "$FAKE_TF_DIR/apply_count" 2>/dev/null || echo 0)
    n=$((n + 1))
    echo "$n" > "$FAKE_TF_DIR/apply_count"
    limit=$(cat "$FAKE_TF_DIR/apply_failures" 2>/dev/null || echo 0)
    if [ "$n" -le "$limit" ]; then
      echo "Error: Failed to query available provider packages" >&2
      exit 1
    fi
    if [ -f "$FAKE_TF_DIR/apply_denied" ]; then
      echo "Error: creating EC2 Instance: UnauthorizedOperation" >&2
      exit 1
    fi
    echo "Apply complete! Resources: 9 added, 0 changed, 0 destroyed."
    ;;
  output)
    case "$4" in
      kafka_consumer_public_ip) echo '"54.210.10.20"' ;;
      vpc_id) echo '"vpc-0a1b2c3d"' ;;
      tags) echo '{"Environment":"test","Project":"kafka-clickhouse-pipeline-test"}' ;;
      nothing) echo 'null' ;;
      *)
        echo "Error: Output \"$4\" not found" >&2
        exit 1
        ;;
    esac
    ;;
  destroy)
    if [ -f "$FAKE_TF_DIR/destroy_fails" ]; then
      echo "Error: DependencyViolation" >&2
      exit 1
    fi
    echo "Destroy complete! Resources: 9 destroyed."
    ;;
  validate)
    if [ -f "$FAKE_TF_DIR/invalid" ]; then
      echo "Error: Unsupported argument" >&2
      exit 1
    fi
    echo "Success! The configuration is valid."
    ;;
  *)
    exit 2
    ;;
esac
"#;

/// Serializes tests that write and execute scripts (avoids ETXTBSY races).
pub fn script_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|poison| poison.into_inner())
}

/// Fake terraform installation plus a module directory.
pub struct FakeTerraform {
    /// Holds the script, logs, and module directory.
    pub root: TempDir,
    /// Path to the fake binary.
    pub binary: PathBuf,
    /// Directory passed as the working directory.
    pub module_dir: PathBuf,
}

impl FakeTerraform {
    /// Installs the fake binary in a fresh temp directory.
    pub fn install() -> Result<Self, String> {
        let root = tempfile::tempdir().map_err(|err| err.to_string())?;
        let binary = root.path().join("terraform");
        fs::write(&binary, FAKE_TERRAFORM).map_err(|err| err.to_string())?;
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))
            .map_err(|err| err.to_string())?;
        let module_dir = root.path().join("module");
        fs::create_dir(&module_dir).map_err(|err| err.to_string())?;
        Ok(Self {
            root,
            binary,
            module_dir,
        })
    }

    /// Returns the state directory exported as `FAKE_TF_DIR`.
    pub fn state_dir(&self) -> &Path {
        self.root.path()
    }

    /// Creates a marker file that toggles fake behavior.
    pub fn set_flag(&self, name: &str, contents: &str) -> Result<(), String> {
        fs::write(self.root.path().join(name), contents).map_err(|err| err.to_string())
    }

    /// Returns the logged invocations, one per line.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.root.path().join("calls.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Returns the last var file the fake received.
    pub fn vars_json(&self) -> Result<serde_json::Value, String> {
        let raw = fs::read_to_string(self.root.path().join("vars.json"))
            .map_err(|err| err.to_string())?;
        serde_json::from_str(&raw).map_err(|err| err.to_string())
    }

    /// Returns the environment line captured on the last call.
    pub fn env_line(&self) -> String {
        fs::read_to_string(self.root.path().join("env.log")).unwrap_or_default()
    }
}
