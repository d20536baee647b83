// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for infra-harness system-tests.
// Purpose: Provide harness construction and artifact utilities.
// Dependencies: system-tests, infra-harness-core, infra-harness-terraform
// ============================================================================

//! ## Overview
//! Shared helpers for infra-harness system-tests.
//! Every live test provisions real resources, so each helper that builds a
//! harness also wires the audit log into the test's artifact root.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod artifacts;
pub mod harness;
