// crates/infra-harness-core/src/core/mod.rs
// ============================================================================
// Module: Infra Harness Core Types
// Description: Scenario declarations, resource facts, and run outcomes.
// Purpose: Provide stable, serializable types shared by every harness crate.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Core types define what a scenario declares (variables, environment tag,
//! checks), what the cloud-fact collaborator returns, and what a run reports.
//! These types are the canonical source for config files and run summaries.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod facts;
pub mod identifiers;
pub mod outcome;
pub mod scenario;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use facts::CidrBlock;
pub use facts::CidrError;
pub use facts::IngressRule;
pub use facts::SecurityGroupFacts;
pub use identifiers::OutputName;
pub use identifiers::ScenarioId;
pub use outcome::AssertionReport;
pub use outcome::ScenarioOutcome;
pub use outcome::ScenarioStatus;
pub use outcome::TeardownStatus;
pub use scenario::Check;
pub use scenario::Scenario;
pub use scenario::ScenarioError;
pub use scenario::VarValue;
