// crates/infra-harness-core/tests/common/mod.rs
// ============================================================================
// Module: Harness Test Fixtures
// Description: In-memory collaborators and audit recorders for harness tests.
// Purpose: Observe apply/output/destroy traffic without real infrastructure.
// Dependencies: infra-harness-core
// ============================================================================

//! ## Overview
//! Scripted collaborators that record every call so tests can assert the
//! teardown guarantee and the order of collaborator traffic.

#![allow(dead_code, reason = "Shared fixtures are reused across multiple test binaries.")]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use infra_harness_core::CloudFacts;
use infra_harness_core::FactsError;
use infra_harness_core::HarnessAuditEvent;
use infra_harness_core::HarnessAuditSink;
use infra_harness_core::HarnessEventKind;
use infra_harness_core::IngressRule;
use infra_harness_core::OutputName;
use infra_harness_core::ProvisionError;
use infra_harness_core::ProvisionHandle;
use infra_harness_core::ProvisionRequest;
use infra_harness_core::Provisioner;
use infra_harness_core::SecurityGroupFacts;

/// Collaborator call recorded by the stubs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Apply(String),
    Output(String),
    Destroy(String),
    Validate(String),
}

/// Scripted provisioner.
#[derive(Default)]
pub struct StubProvisioner {
    pub outputs: BTreeMap<String, String>,
    pub fail_apply: Option<String>,
    pub fail_destroy: Option<String>,
    pub fail_validate: Option<String>,
    pub calls: Mutex<Vec<Call>>,
    pub last_request: Mutex<Option<ProvisionRequest>>,
}

impl StubProvisioner {
    pub fn with_outputs(pairs: &[(&str, &str)]) -> Self {
        Self {
            outputs: pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn destroy_count(&self) -> usize {
        self.calls().iter().filter(|call| matches!(call, Call::Destroy(_))).count()
    }

    pub fn output_count(&self) -> usize {
        self.calls().iter().filter(|call| matches!(call, Call::Output(_))).count()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Provisioner for StubProvisioner {
    fn apply(&self, request: &ProvisionRequest) -> Result<ProvisionHandle, ProvisionError> {
        self.push(Call::Apply(request.scenario_id.to_string()));
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(message) = &self.fail_apply {
            return Err(ProvisionError::Apply(message.clone()));
        }
        Ok(ProvisionHandle::new(request.scenario_id.clone(), request.working_dir.clone()))
    }

    fn output(
        &self,
        _handle: &ProvisionHandle,
        name: &OutputName,
    ) -> Result<String, ProvisionError> {
        self.push(Call::Output(name.to_string()));
        self.outputs
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| ProvisionError::OutputNotFound(name.to_string()))
    }

    fn destroy(&self, request: &ProvisionRequest) -> Result<(), ProvisionError> {
        self.push(Call::Destroy(request.scenario_id.to_string()));
        match &self.fail_destroy {
            Some(message) => Err(ProvisionError::Destroy(message.clone())),
            None => Ok(()),
        }
    }

    fn validate(&self, working_dir: &Path) -> Result<(), ProvisionError> {
        self.push(Call::Validate(working_dir.display().to_string()));
        match &self.fail_validate {
            Some(message) => Err(ProvisionError::Validation(message.clone())),
            None => Ok(()),
        }
    }
}

/// Scripted cloud-fact collaborator keyed by security group id.
#[derive(Default)]
pub struct StubFacts {
    pub groups: BTreeMap<String, SecurityGroupFacts>,
    pub queries: Mutex<Vec<(String, String)>>,
}

impl StubFacts {
    pub fn with_ssh_open(group_id: &str, vpc_id: &str, cidr: &str) -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(
            group_id.to_string(),
            SecurityGroupFacts {
                group_id: group_id.to_string(),
                vpc_id: vpc_id.to_string(),
                ingress: vec![IngressRule {
                    protocol: "tcp".to_string(),
                    from_port: Some(22),
                    to_port: Some(22),
                    cidrs: vec![cidr.to_string()],
                }],
            },
        );
        Self {
            groups,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl CloudFacts for StubFacts {
    fn security_group(
        &self,
        group_id: &str,
        vpc_id: &str,
    ) -> Result<SecurityGroupFacts, FactsError> {
        self.queries.lock().unwrap().push((group_id.to_string(), vpc_id.to_string()));
        self.groups
            .get(group_id)
            .filter(|facts| facts.vpc_id == vpc_id)
            .cloned()
            .ok_or_else(|| FactsError::NotFound(group_id.to_string()))
    }
}

/// Audit sink that keeps events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    pub events: Mutex<Vec<HarnessAuditEvent>>,
}

impl RecordingAuditSink {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<HarnessEventKind> {
        self.events.lock().unwrap().iter().map(|event| event.event).collect()
    }
}

impl HarnessAuditSink for RecordingAuditSink {
    fn record(&self, event: &HarnessAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
