// crates/infra-harness-aws/src/lib.rs
// ============================================================================
// Module: Infra Harness AWS Library
// Description: Cloud-fact collaborator backed by the EC2 API.
// Purpose: Answer security group queries for port reachability checks.
// Dependencies: aws-config, aws-sdk-ec2, tokio
// ============================================================================

//! ## Overview
//! [`Ec2CloudFacts`] implements [`infra_harness_core::CloudFacts`] with
//! `DescribeSecurityGroups`. Credentials and (optionally) region come from the
//! AWS default provider chain.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod ec2_facts;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use ec2_facts::Ec2CloudFacts;
pub use ec2_facts::Ec2CloudFactsConfig;
pub use ec2_facts::ingress_rule_from_sdk;
pub use ec2_facts::security_group_from_sdk;
