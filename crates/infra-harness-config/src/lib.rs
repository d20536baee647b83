// crates/infra-harness-config/src/lib.rs
// ============================================================================
// Module: Infra Harness Config Library
// Description: Suite file model, environment overrides, and validation.
// Purpose: Single source of truth for infra-harness suite semantics.
// Dependencies: infra-harness-core, serde, toml
// ============================================================================

//! ## Overview
//! `infra-harness-config` loads suite files: a `[harness]` table with runner
//! settings and one `[[scenario]]` table per infrastructure test case. Loading
//! is strict and fails closed: oversized files, non-UTF-8 content, unknown
//! harness keys, duplicate scenario ids, and malformed checks are all rejected
//! before any infrastructure is touched.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod env;
pub mod suite;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use env::EnvOverrides;
pub use env::HarnessEnv;
pub use env::read_env_strict;
pub use suite::*;
