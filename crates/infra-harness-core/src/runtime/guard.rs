// crates/infra-harness-core/src/runtime/guard.rs
// ============================================================================
// Module: Teardown Guard
// Description: Scoped acquisition of the provision/destroy lifecycle.
// Purpose: Request destroy exactly once on every exit path after arming.
// Dependencies: crate::{audit, interfaces}
// ============================================================================

//! ## Overview
//! A [`TeardownGuard`] is armed before apply is requested. Destroy runs from
//! [`TeardownGuard::teardown`] or, failing that, from `Drop` (error returns and
//! panic unwinding). Process termination skips `Drop` and voids the guarantee.
//!
//! Invariants:
//! - Destroy is requested at most once per guard.
//! - The handle is dropped before destroy is requested.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::audit::HarnessAuditEvent;
use crate::audit::HarnessAuditSink;
use crate::audit::HarnessEventKind;
use crate::interfaces::ProvisionError;
use crate::interfaces::ProvisionHandle;
use crate::interfaces::ProvisionRequest;
use crate::interfaces::Provisioner;

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Guard that owns a provisioned environment until it is destroyed.
pub struct TeardownGuard<'a, P: Provisioner + ?Sized> {
    /// Provisioning collaborator.
    provisioner: &'a P,
    /// Request used for apply and destroy.
    request: &'a ProvisionRequest,
    /// Audit sink for lifecycle events.
    audit: &'a dyn HarnessAuditSink,
    /// Handle returned by a successful apply.
    handle: Option<ProvisionHandle>,
    /// True until destroy has been requested.
    armed: bool,
}

impl<'a, P: Provisioner + ?Sized> TeardownGuard<'a, P> {
    /// Arms a guard for the request. Destroy is owed from this point on.
    #[must_use]
    pub fn arm(
        provisioner: &'a P,
        request: &'a ProvisionRequest,
        audit: &'a dyn HarnessAuditSink,
    ) -> Self {
        Self {
            provisioner,
            request,
            audit,
            handle: None,
            armed: true,
        }
    }

    /// Requests apply and stores the resulting handle.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Apply`] when apply fails, was already
    /// requested, or the guard has already torn down.
    pub fn apply(&mut self) -> Result<&ProvisionHandle, ProvisionError> {
        if !self.armed || self.handle.is_some() {
            return Err(ProvisionError::Apply("apply already requested for this guard".to_string()));
        }
        self.audit.record(
            &HarnessAuditEvent::new(HarnessEventKind::ApplyRequested)
                .scenario(&self.request.scenario_id)
                .subject(self.request.working_dir.display().to_string()),
        );
        match self.provisioner.apply(self.request) {
            Ok(handle) => Ok(self.handle.insert(handle)),
            Err(err) => {
                self.audit.record(
                    &HarnessAuditEvent::new(HarnessEventKind::ApplyFailed)
                        .scenario(&self.request.scenario_id)
                        .outcome("error")
                        .message(err.to_string()),
                );
                Err(err)
            }
        }
    }

    /// Returns the handle when apply succeeded.
    #[must_use]
    pub const fn handle(&self) -> Option<&ProvisionHandle> {
        self.handle.as_ref()
    }

    /// Returns true while destroy is still owed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Requests destroy now and disarms the guard.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Destroy`] when destroy fails.
    pub fn teardown(mut self) -> Result<(), ProvisionError> {
        self.destroy_once()
    }

    /// Requests destroy if still armed.
    fn destroy_once(&mut self) -> Result<(), ProvisionError> {
        if !self.armed {
            return Ok(());
        }
        self.armed = false;
        self.handle = None;
        let result = self.provisioner.destroy(self.request);
        let event = match &result {
            Ok(()) => HarnessAuditEvent::new(HarnessEventKind::DestroyCompleted).outcome("ok"),
            Err(err) => HarnessAuditEvent::new(HarnessEventKind::DestroyFailed)
                .outcome("error")
                .message(err.to_string()),
        };
        self.audit.record(&event.scenario(&self.request.scenario_id));
        result
    }
}

impl<P: Provisioner + ?Sized> Drop for TeardownGuard<'_, P> {
    fn drop(&mut self) {
        let _ = self.destroy_once();
    }
}
