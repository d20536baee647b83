// system-tests/tests/helpers/harness.rs
// ============================================================================
// Module: Live Harness
// Description: Builds harnesses backed by the real terraform binary.
// Purpose: Share provisioner and audit wiring across live suites.
// Dependencies: system-tests, infra-harness-core, infra-harness-terraform
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use infra_harness_core::Harness;
use infra_harness_core::HarnessFileAuditSink;
use infra_harness_core::NoCloudFacts;
use infra_harness_terraform::TerraformProvisioner;
use system_tests::config::SystemTestConfig;
use system_tests::scenarios::default_terraform_dir;

use super::artifacts::TestArtifacts;

type DynError = Box<dyn std::error::Error>;

/// Default terraform binary resolved from `PATH`.
const DEFAULT_TERRAFORM_BINARY: &str = "terraform";

/// Returns the infrastructure definitions directory for live runs.
pub fn terraform_dir(config: &SystemTestConfig) -> PathBuf {
    config.terraform_dir.clone().unwrap_or_else(default_terraform_dir)
}

/// Builds a terraform provisioner honoring the binary override.
pub fn provisioner(config: &SystemTestConfig) -> Result<TerraformProvisioner, DynError> {
    let binary = config
        .terraform_binary
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TERRAFORM_BINARY));
    Ok(TerraformProvisioner::new(binary)?)
}

/// Builds a harness that audits into the test's artifact root.
pub fn live_harness(
    config: &SystemTestConfig,
    artifacts: &TestArtifacts,
) -> Result<Harness<TerraformProvisioner, NoCloudFacts>, DynError> {
    let audit = HarnessFileAuditSink::new(&artifacts.audit_log())?;
    Ok(Harness::new(provisioner(config)?, Arc::new(audit)))
}
