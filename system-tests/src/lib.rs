// system-tests/src/lib.rs
// ============================================================================
// Module: Infra Harness System Tests Library
// Description: Shared configuration and scenarios for live system tests.
// Purpose: Provide common utilities for the system-test binaries.
// Dependencies: infra-harness-core
// ============================================================================

//! ## Overview
//! This crate hosts the environment configuration and the pipeline scenario
//! definitions used by the live suites in `system-tests/tests`. Live suites
//! create real cloud resources and only build with the `system-tests`
//! feature; the scenario definitions themselves are unit tested offline.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod scenarios;
