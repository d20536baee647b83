// system-tests/tests/suites/pipeline.rs
// ============================================================================
// Module: Pipeline Provisioning Tests
// Description: Live apply, verify, and destroy runs of the pipeline stack.
// Purpose: Prove the stack deploys with the expected outputs and network rules.
// Dependencies: system-tests helpers, infra-harness-aws
// ============================================================================

//! ## Overview
//! Live apply, verify, and destroy runs of the pipeline stack.
//! Each test provisions real AWS resources and requires credentials plus a
//! terraform binary. Teardown runs on every path, so a failing assertion
//! still leaves the account clean.

use infra_harness_aws::Ec2CloudFacts;
use infra_harness_aws::Ec2CloudFactsConfig;
use infra_harness_core::ScenarioOutcome;
use infra_harness_core::TeardownStatus;
use system_tests::config::SystemTestConfig;
use system_tests::scenarios::CONSUMER_IP_OUTPUT;
use system_tests::scenarios::infrastructure_scenario;
use system_tests::scenarios::variables_scenario;

use crate::helpers::artifacts::TestReporter;
use crate::helpers::harness::live_harness;
use crate::helpers::harness::terraform_dir;

type DynError = Box<dyn std::error::Error>;

fn ensure_clean_pass(outcome: &ScenarioOutcome) -> Result<(), DynError> {
    if let Some(failure) = outcome.first_failure() {
        return Err(format!("{} failed: {}", failure.check, failure.message).into());
    }
    if outcome.teardown != TeardownStatus::Completed {
        return Err(format!("{} did not tear down", outcome.scenario_id).into());
    }
    Ok(())
}

/// Deploys the default stack and checks outputs plus SSH exposure.
#[test]
fn terraform_infrastructure() -> Result<(), DynError> {
    let mut reporter = TestReporter::new("terraform_infrastructure")?;
    let config = SystemTestConfig::load()?;
    let scenario = infrastructure_scenario(&terraform_dir(&config));
    let facts = Ec2CloudFacts::new(&Ec2CloudFactsConfig::for_scenario(&scenario))?;
    let harness = live_harness(&config, reporter.artifacts())?.with_cloud_facts(facts);

    let result = harness.run_scenario(&scenario);
    reporter.finish_scenario(&result)?;
    ensure_clean_pass(&result?)?;
    drop(reporter);
    Ok(())
}

/// Deploys with alternate region and network ranges.
#[test]
fn terraform_variables() -> Result<(), DynError> {
    let mut reporter = TestReporter::new("terraform_variables")?;
    let config = SystemTestConfig::load()?;
    let scenario = variables_scenario(&terraform_dir(&config));
    let harness = live_harness(&config, reporter.artifacts())?;

    let result = harness.run_scenario(&scenario);
    reporter.finish_scenario(&result)?;
    let outcome = result?;
    ensure_clean_pass(&outcome)?;
    if outcome.outputs.get(CONSUMER_IP_OUTPUT).is_none_or(|ip| ip.trim().is_empty()) {
        return Err("consumer public ip missing from outputs".into());
    }
    drop(reporter);
    Ok(())
}

/// Validates the definitions without provisioning anything.
#[test]
fn terraform_validation() -> Result<(), DynError> {
    let mut reporter = TestReporter::new("terraform_validation")?;
    let config = SystemTestConfig::load()?;
    let dir = terraform_dir(&config);
    let harness = live_harness(&config, reporter.artifacts())?;

    if let Err(err) = harness.validate_definitions(&dir) {
        reporter.finish("fail", vec![err.to_string()], Vec::new())?;
        return Err(err.into());
    }
    reporter.finish(
        "pass",
        vec![format!("{} definitions are valid", dir.display())],
        vec!["summary.json".to_string(), "summary.md".to_string()],
    )?;
    drop(reporter);
    Ok(())
}
