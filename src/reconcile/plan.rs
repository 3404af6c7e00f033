//! Pure planning of the action sequence needed to converge.

use crate::gateway::AttachMode;

use super::error::ReconcileError;
use super::{AttachmentFact, DesiredState, Lifecycle, Observation};

/// The ordered set of actions a run will execute.
///
/// Execution order is fixed: create, then attach, then detach, then destroy.
/// The present and absent branches never populate each other's steps, which
/// makes the ordering invariants (create before attach, detach before
/// destroy) structural rather than procedural.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Plan {
    /// Create the disk with this size, in gigabytes.
    pub(crate) create: Option<u32>,
    /// Attach the disk to the named instance with this mode.
    pub(crate) attach: Option<AttachMode>,
    /// Detach the disk from the named instance.
    pub(crate) detach: bool,
    /// Destroy the disk.
    pub(crate) destroy: bool,
}

impl Plan {
    /// Returns `true` when the run has nothing to do.
    pub(crate) const fn is_noop(self) -> bool {
        self.create.is_none() && self.attach.is_none() && !self.detach && !self.destroy
    }
}

/// Decides which actions are needed to move the observed state to the
/// desired state. Pure: no provider calls are made here.
pub(crate) fn plan(
    desired: &DesiredState,
    observation: &Observation,
) -> Result<Plan, ReconcileError> {
    match desired.lifecycle {
        Lifecycle::Present => plan_present(desired, observation),
        Lifecycle::Absent => Ok(plan_absent(desired, observation)),
    }
}

fn plan_present(
    desired: &DesiredState,
    observation: &Observation,
) -> Result<Plan, ReconcileError> {
    let size_gb = desired.requested_size_gb()?;

    // A named instance that could not be observed is fatal before any disk
    // mutation: creating the disk would not help the caller attach it.
    if let Some(instance_name) = &desired.instance_name
        && observation.instance.is_none()
    {
        return Err(ReconcileError::InstanceNotFound {
            name: instance_name.clone(),
            zone: desired.zone.clone(),
        });
    }

    let mut plan = Plan::default();
    if observation.volume.is_none() {
        plan.create = Some(size_gb);
    }
    if observation.instance.is_some() && observation.attachment == AttachmentFact::Detached {
        plan.attach = Some(desired.mode);
    }
    Ok(plan)
}

fn plan_absent(desired: &DesiredState, observation: &Observation) -> Plan {
    let mut plan = Plan::default();
    if observation.volume.is_none() {
        // Nothing to detach or destroy; the absent state already holds.
        return plan;
    }
    if observation.instance.is_some()
        && matches!(observation.attachment, AttachmentFact::Attached { .. })
    {
        plan.detach = true;
    }
    if !desired.detach_only {
        plan.destroy = true;
    }
    plan
}
