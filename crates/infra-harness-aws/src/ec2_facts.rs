// crates/infra-harness-aws/src/ec2_facts.rs
// ============================================================================
// Module: EC2 Cloud Facts
// Description: Security group lookups through DescribeSecurityGroups.
// Purpose: Resolve security group facts for a provisioned environment.
// Dependencies: aws-config, aws-sdk-ec2, infra-harness-core, tokio
// ============================================================================

//! ## Overview
//! One `DescribeSecurityGroups` call per query, filtered by `group-id` and
//! `vpc-id`. Zero matches is [`FactsError::NotFound`]. Calls block on an
//! owned Tokio runtime; there is no harness-level timeout.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::Filter;
use aws_sdk_ec2::types::IpPermission;
use aws_sdk_ec2::types::SecurityGroup;
use infra_harness_core::CloudFacts;
use infra_harness_core::FactsError;
use infra_harness_core::IngressRule;
use infra_harness_core::Scenario;
use infra_harness_core::SecurityGroupFacts;
use serde::Deserialize;
use serde::Serialize;
use tokio::runtime::Runtime;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the EC2 cloud-fact collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ec2CloudFactsConfig {
    /// AWS region (optional; falls back to environment configuration).
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint URL (for EC2-compatible emulators).
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Ec2CloudFactsConfig {
    /// Returns a config targeting the scenario's `aws_region` variable.
    #[must_use]
    pub fn for_scenario(scenario: &Scenario) -> Self {
        Self {
            region: scenario.region().map(str::to_string),
            endpoint: None,
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// EC2-backed cloud facts.
pub struct Ec2CloudFacts {
    /// EC2 client handle.
    client: Client,
    /// Tokio runtime for blocking EC2 calls.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for Ec2CloudFacts {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = std::thread::spawn(move || drop(runtime));
        }
    }
}

impl Ec2CloudFacts {
    /// Creates a new EC2 cloud-fact collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::Provider`] when the runtime cannot be created.
    pub fn new(config: &Ec2CloudFactsConfig) -> Result<Self, FactsError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| FactsError::Provider(err.to_string()))?;
        let shared_config = runtime.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = &config.region {
                loader = loader.region(Region::new(region.clone()));
            }
            if let Some(endpoint) = &config.endpoint {
                loader = loader.endpoint_url(endpoint);
            }
            loader.load().await
        });
        let client = Client::new(&shared_config);
        Ok(Self {
            client,
            runtime: Some(Arc::new(runtime)),
        })
    }
}

impl CloudFacts for Ec2CloudFacts {
    fn security_group(
        &self,
        group_id: &str,
        vpc_id: &str,
    ) -> Result<SecurityGroupFacts, FactsError> {
        let client = self.client.clone();
        let output = self
            .runtime
            .as_ref()
            .ok_or_else(|| FactsError::Provider("ec2 client closed".to_string()))?
            .block_on(async {
                client
                    .describe_security_groups()
                    .filters(Filter::builder().name("group-id").values(group_id).build())
                    .filters(Filter::builder().name("vpc-id").values(vpc_id).build())
                    .send()
                    .await
            })
            .map_err(|err| FactsError::Provider(err.to_string()))?;
        output
            .security_groups()
            .first()
            .map(security_group_from_sdk)
            .ok_or_else(|| FactsError::NotFound(format!("{group_id} in {vpc_id}")))
    }
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

/// Converts an SDK security group into harness facts.
#[must_use]
pub fn security_group_from_sdk(group: &SecurityGroup) -> SecurityGroupFacts {
    SecurityGroupFacts {
        group_id: group.group_id().unwrap_or_default().to_string(),
        vpc_id: group.vpc_id().unwrap_or_default().to_string(),
        ingress: group.ip_permissions().iter().map(ingress_rule_from_sdk).collect(),
    }
}

/// Converts one SDK ingress permission. IPv4 and IPv6 ranges are merged.
#[must_use]
pub fn ingress_rule_from_sdk(permission: &IpPermission) -> IngressRule {
    let ipv4 = permission.ip_ranges().iter().filter_map(|range| range.cidr_ip());
    let ipv6 = permission.ipv6_ranges().iter().filter_map(|range| range.cidr_ipv6());
    IngressRule {
        protocol: permission.ip_protocol().unwrap_or_default().to_string(),
        from_port: permission.from_port(),
        to_port: permission.to_port(),
        cidrs: ipv4.chain(ipv6).map(str::to_string).collect(),
    }
}
