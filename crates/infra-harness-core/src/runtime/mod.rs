// crates/infra-harness-core/src/runtime/mod.rs
// ============================================================================
// Module: Infra Harness Runtime
// Description: Scenario execution, check evaluation, and guaranteed teardown.
// Purpose: Drive collaborators through one scenario lifecycle.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime arms a [`TeardownGuard`] before apply is requested, reads
//! outputs, queries facts, evaluates checks, and tears down exactly once.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod assertions;
pub mod guard;
pub mod harness;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use guard::TeardownGuard;
pub use harness::Harness;
pub use harness::HarnessError;
