// crates/infra-harness-core/src/lib.rs
// ============================================================================
// Module: Infra Harness Core Library
// Description: Public API surface for the infrastructure validation harness.
// Purpose: Expose scenario types, collaborator interfaces, and the runtime.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Infra Harness core declares scenarios against infrastructure definitions,
//! drives a provisioning collaborator through apply and destroy, reads back
//! named outputs, queries resource facts, and evaluates checks. Teardown is
//! guaranteed once apply has been requested, including on assertion failure
//! and panic unwinding.
//!
//! The core is backend-agnostic: Terraform and AWS live in sibling crates and
//! integrate through [`Provisioner`] and [`CloudFacts`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use audit::HarnessAuditEvent;
pub use audit::HarnessAuditSink;
pub use audit::HarnessEventKind;
pub use audit::HarnessFileAuditSink;
pub use audit::HarnessNoopAuditSink;
pub use audit::HarnessStderrAuditSink;
pub use interfaces::CloudFacts;
pub use interfaces::FactsError;
pub use interfaces::NoCloudFacts;
pub use interfaces::ProvisionError;
pub use interfaces::ProvisionHandle;
pub use interfaces::ProvisionRequest;
pub use interfaces::Provisioner;
pub use runtime::Harness;
pub use runtime::HarnessError;
pub use runtime::TeardownGuard;
