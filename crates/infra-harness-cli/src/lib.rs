// crates/infra-harness-cli/src/lib.rs
// ============================================================================
// Module: Infra Harness CLI Library
// Description: Shared helpers for the infra-harness command-line interface.
// Purpose: Provide the run loop and run reports to the binary and tests.
// Dependencies: infra-harness-aws, infra-harness-config, infra-harness-core,
//               infra-harness-terraform, serde, serde_jcs
// ============================================================================

//! ## Overview
//! This library houses the pieces of the `infra-harness` binary that are worth
//! testing without spawning it: collaborator wiring, the scenario run loop,
//! and the per-run summary artifacts. The binary entry point (`src/main.rs`)
//! handles argument parsing and terminal output only.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Per-run artifact roots and summaries.
pub mod report;
/// Collaborator wiring and the scenario run loop.
pub mod runner;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use report::RunArtifacts;
pub use report::RunMode;
pub use report::RunReporter;
pub use report::RunSummary;
pub use report::ScenarioSummary;
pub use runner::RunnerError;
pub use runner::SuiteRunner;
