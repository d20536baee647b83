// crates/infra-harness-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for suite validation tests.
// Purpose: Reduce duplication across integration tests for infra-harness-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::PathBuf;

use infra_harness_config::ConfigError;
use tempfile::TempDir;

/// Suite mirroring the pipeline infrastructure test.
pub const INFRASTRUCTURE_SUITE: &str = r#"
[harness]
terraform_binary = "terraform"

[[scenario]]
id = "infrastructure"
working_dir = "../terraform"
environment = "test"
use_default_retryable_errors = true

[scenario.vars]
aws_region = "us-east-1"
instance_type = "t3.micro"
vpc_cidr = "10.0.0.0/16"
subnet_cidr = "10.0.1.0/24"
project_name = "kafka-clickhouse-pipeline-test"
tags = { Environment = "test", Project = "kafka-clickhouse-pipeline-test" }

[[scenario.check]]
kind = "output_not_empty"
output = "kafka_consumer_public_ip"

[[scenario.check]]
kind = "port_open_to_cidr"
security_group_output = "kafka_consumer_security_group_id"
vpc_output = "vpc_id"
port = 22
cidr = "0.0.0.0/0"
"#;

/// Writes `content` to `suite.toml` inside a fresh temp directory.
pub fn write_suite(content: &str) -> Result<(TempDir, PathBuf), String> {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("suite.toml");
    fs::write(&path, content).map_err(|err| err.to_string())?;
    Ok((dir, path))
}

/// Asserts that a result is an error whose message contains `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
