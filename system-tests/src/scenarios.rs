// system-tests/src/scenarios.rs
// ============================================================================
// Module: Pipeline Scenarios
// Description: Scenario definitions for the Kafka to ClickHouse pipeline stack.
// Purpose: Share one definition of the live scenarios across suites and tests.
// Dependencies: infra-harness-core
// ============================================================================

//! ## Overview
//! The pipeline stack is exercised three ways: a full `us-east-1` deployment
//! with output and SSH reachability checks, a `us-west-2` deployment with
//! alternate network ranges, and a static validation of the definitions.
//! `fixtures/pipeline.toml` describes the same two provisioning scenarios for
//! the `infra-harness` CLI.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use infra_harness_core::Check;
use infra_harness_core::OutputName;
use infra_harness_core::Scenario;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Project name passed to the stack and used in resource tags.
pub const PROJECT_NAME: &str = "kafka-clickhouse-pipeline-test";
/// Environment tag for every pipeline scenario.
pub const ENVIRONMENT: &str = "test";
/// Output holding the consumer instance public IP.
pub const CONSUMER_IP_OUTPUT: &str = "kafka_consumer_public_ip";
/// Output holding the VPC identifier.
pub const VPC_ID_OUTPUT: &str = "vpc_id";
/// Output holding the consumer security group identifier.
pub const CONSUMER_SG_OUTPUT: &str = "kafka_consumer_security_group_id";
/// Management CIDR that must reach the consumer over SSH.
pub const MANAGEMENT_CIDR: &str = "0.0.0.0/0";
/// SSH port.
pub const SSH_PORT: u16 = 22;

/// Infrastructure definitions relative to the workspace root.
const TERRAFORM_DIR: &str = "deploy/terraform";

// ============================================================================
// SECTION: Scenarios
// ============================================================================

/// Returns the default infrastructure definitions directory.
#[must_use]
pub fn default_terraform_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(TERRAFORM_DIR)
}

/// Returns the resource tags applied by every pipeline scenario.
#[must_use]
pub fn pipeline_tags() -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    tags.insert("Environment".to_string(), ENVIRONMENT.to_string());
    tags.insert("Project".to_string(), PROJECT_NAME.to_string());
    tags
}

/// Network and sizing inputs that vary between pipeline deployments.
struct Deployment<'a> {
    /// AWS region.
    region: &'a str,
    /// EC2 instance type.
    instance_type: &'a str,
    /// VPC CIDR block.
    vpc_cidr: &'a str,
    /// Subnet CIDR block.
    subnet_cidr: &'a str,
}

/// Builds a pipeline scenario with the shared variables and retry policy.
fn pipeline_scenario(id: &str, terraform_dir: &Path, deployment: &Deployment<'_>) -> Scenario {
    Scenario::new(id, terraform_dir)
        .with_environment(ENVIRONMENT)
        .with_default_retryable_errors(true)
        .with_var("aws_region", deployment.region)
        .with_var("instance_type", deployment.instance_type)
        .with_var("vpc_cidr", deployment.vpc_cidr)
        .with_var("subnet_cidr", deployment.subnet_cidr)
        .with_var("project_name", PROJECT_NAME)
        .with_var("tags", pipeline_tags())
}

/// Returns a non-empty check for the named output.
fn not_empty(output: &str) -> Check {
    Check::OutputNotEmpty {
        output: OutputName::new(output),
    }
}

/// Full `us-east-1` deployment: outputs present and SSH open from management.
#[must_use]
pub fn infrastructure_scenario(terraform_dir: &Path) -> Scenario {
    let deployment = Deployment {
        region: "us-east-1",
        instance_type: "t3.micro",
        vpc_cidr: "10.0.0.0/16",
        subnet_cidr: "10.0.1.0/24",
    };
    pipeline_scenario("infrastructure", terraform_dir, &deployment)
        .with_check(not_empty(CONSUMER_IP_OUTPUT))
        .with_check(not_empty(VPC_ID_OUTPUT))
        .with_check(not_empty(CONSUMER_SG_OUTPUT))
        .with_check(Check::PortOpenToCidr {
            security_group_output: OutputName::new(CONSUMER_SG_OUTPUT),
            vpc_output: OutputName::new(VPC_ID_OUTPUT),
            port: SSH_PORT,
            cidr: MANAGEMENT_CIDR.to_string(),
            expected: true,
        })
}

/// `us-west-2` deployment with alternate network ranges.
#[must_use]
pub fn variables_scenario(terraform_dir: &Path) -> Scenario {
    let deployment = Deployment {
        region: "us-west-2",
        instance_type: "t3.small",
        vpc_cidr: "172.16.0.0/16",
        subnet_cidr: "172.16.1.0/24",
    };
    pipeline_scenario("variables", terraform_dir, &deployment)
        .with_check(not_empty(CONSUMER_IP_OUTPUT))
}
