// crates/infra-harness-core/src/runtime/assertions.rs
// ============================================================================
// Module: Check Evaluation
// Description: Pure evaluation of declarative checks into reports.
// Purpose: Turn outputs and facts into pass/fail assertion reports.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Evaluation is pure: collaborators are queried by the harness beforehand.
//! Output values are compared after trimming surrounding whitespace, since CLI
//! provisioners commonly emit trailing newlines.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::AssertionReport;
use crate::core::CidrError;
use crate::core::OutputName;
use crate::core::SecurityGroupFacts;

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Checks that an output value is non-blank.
#[must_use]
pub fn output_not_empty(label: &str, name: &OutputName, value: &str) -> AssertionReport {
    if value.trim().is_empty() {
        AssertionReport::fail(label, format!("output {name} is empty"))
    } else {
        AssertionReport::pass(label, format!("output {name} is set"))
    }
}

/// Checks that an output value equals the expected string.
#[must_use]
pub fn output_equals(
    label: &str,
    name: &OutputName,
    value: &str,
    expected: &str,
) -> AssertionReport {
    let actual = value.trim();
    if actual == expected {
        AssertionReport::pass(label, format!("output {name} equals {expected}"))
    } else {
        AssertionReport::fail(label, format!("output {name}: expected {expected}, got {actual}"))
    }
}

/// Checks that port reachability from a CIDR matches the expectation.
///
/// # Errors
///
/// Returns [`CidrError`] when `cidr` is not a valid CIDR block.
pub fn port_open_to_cidr(
    label: &str,
    facts: &SecurityGroupFacts,
    port: u16,
    cidr: &str,
    expected: bool,
) -> Result<AssertionReport, CidrError> {
    let open = facts.is_port_open_to_cidr(port, cidr)?;
    let state = if open { "open" } else { "closed" };
    let message = format!("port {port} on {} is {state} to {cidr}", facts.group_id);
    if open == expected {
        Ok(AssertionReport::pass(label, message))
    } else {
        Ok(AssertionReport::fail(label, message))
    }
}
