// crates/infra-harness-terraform/src/lib.rs
// ============================================================================
// Module: Infra Harness Terraform Library
// Description: Provisioning collaborator backed by the terraform CLI.
// Purpose: Turn harness provision requests into terraform invocations.
// Dependencies: infra-harness-core, regex, serde_json, tempfile
// ============================================================================

//! ## Overview
//! [`TerraformProvisioner`] implements [`infra_harness_core::Provisioner`] by
//! shelling out to `terraform`. Variables are passed through a JSON var file
//! written to a private temp directory for each command. Transient provider
//! and registry failures can be retried with [`RetryPolicy`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod command;
pub mod provisioner;
pub mod retry;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use command::CommandOutput;
pub use command::TerraformCli;
pub use command::TerraformError;
pub use provisioner::TerraformProvisioner;
pub use retry::DEFAULT_MAX_RETRIES;
pub use retry::DEFAULT_RETRY_DELAY;
pub use retry::DEFAULT_RETRYABLE_ERRORS;
pub use retry::RetryPolicy;
