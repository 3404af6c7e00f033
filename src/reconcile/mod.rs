//! Reconciliation of one persistent disk against a declared state.
//!
//! A run reads the disk (and optionally one instance), plans the minimal
//! create/attach/detach/destroy sequence needed to converge, executes it
//! strictly sequentially, and folds the results into an [`Outcome`]. No
//! state persists between runs; every invocation starts from a fresh read.

use serde::Serialize;
use tracing::{debug, info};

use crate::gateway::{AttachMode, GatewayError, Instance, ProviderGateway, Volume, VolumeSpec};

mod error;
mod plan;

pub use error::ReconcileError;
use plan::Plan;

/// Declared lifecycle state the reconciler converges toward.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// The disk should exist, and be attached when an instance is named.
    Present,
    /// The disk should not exist, or should only be detached.
    Absent,
}

impl Lifecycle {
    /// Returns the canonical lowercase name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

/// Caller-declared desired state for one disk and its attachment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DesiredState {
    /// Disk name; also used as the device name when attaching.
    pub name: String,
    /// Requested size as supplied by the caller. Coerced to whole gigabytes
    /// only when a creation is actually planned.
    pub size_gb: String,
    /// Zone the disk and instance live in.
    pub zone: String,
    /// Instance to attach to (present) or detach from (absent).
    pub instance_name: Option<String>,
    /// Attachment mode requested for new attachments.
    pub mode: AttachMode,
    /// Lifecycle state to converge toward.
    pub lifecycle: Lifecycle,
    /// Stop after detaching instead of destroying the disk.
    pub detach_only: bool,
}

impl DesiredState {
    /// Creates a desired state with the conventional defaults: 10 GB,
    /// read-only attachment, present lifecycle, no instance.
    #[must_use]
    pub fn new(name: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_owned(),
            size_gb: String::from("10"),
            zone: zone.into().trim().to_owned(),
            instance_name: None,
            mode: AttachMode::ReadOnly,
            lifecycle: Lifecycle::Present,
            detach_only: false,
        }
    }

    /// Sets the requested size from the caller's raw text.
    #[must_use]
    pub fn size_gb(mut self, value: impl Into<String>) -> Self {
        self.size_gb = value.into();
        self
    }

    /// Sets the optional instance name.
    #[must_use]
    pub fn instance_name(mut self, value: Option<String>) -> Self {
        self.instance_name = value.map(|name| name.trim().to_owned());
        self
    }

    /// Sets the attachment mode.
    #[must_use]
    pub const fn mode(mut self, value: AttachMode) -> Self {
        self.mode = value;
        self
    }

    /// Sets the lifecycle state.
    #[must_use]
    pub const fn lifecycle(mut self, value: Lifecycle) -> Self {
        self.lifecycle = value;
        self
    }

    /// Sets the detach-only flag.
    #[must_use]
    pub const fn detach_only(mut self, value: bool) -> Self {
        self.detach_only = value;
        self
    }

    /// Validates invariants that must hold before any provider call.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::DetachRequiresInstance`] when `detach_only`
    /// is set without an instance name.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.detach_only && self.instance_name.is_none() {
            return Err(ReconcileError::DetachRequiresInstance);
        }
        Ok(())
    }

    /// Coerces the raw size into whole gigabytes.
    ///
    /// Loose numeric input rounds to the nearest gigabyte, matching the
    /// tolerance callers expect from declarative tooling.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidSize`] when the value is not numeric
    /// or rounds below one gigabyte.
    pub fn requested_size_gb(&self) -> Result<u32, ReconcileError> {
        let raw = self.size_gb.trim();
        if let Ok(size) = raw.parse::<u32>() {
            if size >= 1 {
                return Ok(size);
            }
            return Err(ReconcileError::InvalidSize {
                raw: self.size_gb.clone(),
            });
        }
        let value: f64 = raw.parse().map_err(|_| ReconcileError::InvalidSize {
            raw: self.size_gb.clone(),
        })?;
        let rounded = value.round();
        if !value.is_finite() || rounded < 1.0 || rounded > f64::from(u32::MAX) {
            return Err(ReconcileError::InvalidSize {
                raw: self.size_gb.clone(),
            });
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "rounded value is checked against the u32 range above"
        )]
        let size = rounded as u32;
        Ok(size)
    }
}

/// Attachment status derived once per run from the instance snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttachmentFact {
    /// The disk is not attached to the observed instance.
    Detached,
    /// The disk is attached with the observed mode.
    Attached {
        /// Mode reported by the provider.
        mode: AttachMode,
    },
}

/// Read-only snapshot gathered before planning.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Observation {
    /// The disk, when it exists.
    pub volume: Option<Volume>,
    /// The instance, when one was named and could be read.
    pub instance: Option<Instance>,
    /// Whether the instance exposes the disk as a device.
    pub attachment: AttachmentFact,
}

impl Observation {
    /// Builds an observation, deriving the attachment fact by scanning the
    /// instance's disks for a device named after the target disk.
    #[must_use]
    pub fn new(volume: Option<Volume>, instance: Option<Instance>, device_name: &str) -> Self {
        let attachment = instance
            .as_ref()
            .and_then(|snapshot| snapshot.attachment(device_name))
            .map_or(AttachmentFact::Detached, |mode| AttachmentFact::Attached {
                mode,
            });
        Self {
            volume,
            instance,
            attachment,
        }
    }
}

/// Record reported after a run. Fully populated on every successful exit
/// path; fatal conditions are reported separately as a failure record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Outcome {
    /// Disk name.
    pub name: String,
    /// Zone the run operated in.
    pub zone: String,
    /// Lifecycle state that was requested.
    pub state: Lifecycle,
    /// Disk size in gigabytes: observed when the disk was found, requested
    /// when it was created this run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<u32>,
    /// Instance the disk is attached to after the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_to_instance: Option<String>,
    /// Mode the disk is attached with after the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_mode: Option<AttachMode>,
    /// Present when the run was asked to stop after detaching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detach_only: Option<bool>,
    /// Instance the disk was detached from this run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detached_from_instance: Option<String>,
    /// Whether any provider mutation was performed.
    pub changed: bool,
}

impl Outcome {
    fn new(desired: &DesiredState) -> Self {
        Self {
            name: desired.name.clone(),
            zone: desired.zone.clone(),
            state: desired.lifecycle,
            size_gb: None,
            attached_to_instance: None,
            attached_mode: None,
            detach_only: desired.detach_only.then_some(true),
            detached_from_instance: None,
            changed: false,
        }
    }
}

/// Converges one disk toward its declared state through a provider gateway.
#[derive(Debug)]
pub struct Reconciler<G> {
    gateway: G,
}

impl<G: ProviderGateway> Reconciler<G> {
    /// Creates a new reconciler over the given gateway.
    #[must_use]
    pub const fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Runs one reconciliation: validate, observe, plan, execute.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] on validation failures and on any fatal
    /// provider failure; completed actions are not rolled back.
    pub async fn converge(&self, desired: &DesiredState) -> Result<Outcome, ReconcileError> {
        desired.validate()?;
        let observation = self.observe(desired).await?;
        let steps = plan::plan(desired, &observation)?;
        if steps.is_noop() {
            debug!(disk = %desired.name, "observed state already matches; nothing to do");
        }
        self.execute(desired, observation, steps).await
    }

    /// Populates the read-only snapshot needed for planning.
    async fn observe(&self, desired: &DesiredState) -> Result<Observation, ReconcileError> {
        let instance = match &desired.instance_name {
            Some(instance_name) => {
                // Lenient read: any lookup failure, not-found included,
                // collapses to "instance unknown" so attach and detach
                // intents surface a clearer error downstream instead of an
                // opaque lookup error.
                match self
                    .gateway
                    .find_instance(instance_name, &desired.zone)
                    .await
                {
                    Ok(snapshot) => Some(snapshot),
                    Err(err) => {
                        debug!(
                            instance = %instance_name,
                            zone = %desired.zone,
                            error = %err,
                            "instance lookup failed; treating instance as unknown"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let volume = match self.gateway.find_volume(&desired.name, &desired.zone).await {
            Ok(snapshot) => Some(snapshot),
            // An absent disk is a normal observation, not a failure.
            Err(GatewayError::NotFound { .. }) => None,
            Err(source) => {
                return Err(ReconcileError::ReadVolume {
                    name: desired.name.clone(),
                    source,
                });
            }
        };

        Ok(Observation::new(volume, instance, &desired.name))
    }

    /// Executes the planned steps in their fixed order, folding results into
    /// the outcome as each provider call completes.
    async fn execute(
        &self,
        desired: &DesiredState,
        observation: Observation,
        steps: Plan,
    ) -> Result<Outcome, ReconcileError> {
        let Observation {
            mut volume,
            instance,
            attachment,
        } = observation;
        let mut outcome = Outcome::new(desired);
        if let Some(observed) = &volume {
            outcome.size_gb = Some(observed.size_gb);
        }
        if desired.lifecycle == Lifecycle::Present
            && let (Some(snapshot), AttachmentFact::Attached { mode }) = (&instance, attachment)
            && steps.attach.is_none()
        {
            // Already attached: report what was observed, not what was asked.
            outcome.attached_to_instance = Some(snapshot.name.clone());
            outcome.attached_mode = Some(mode);
        }

        if let Some(size_gb) = steps.create {
            volume = Some(self.create(desired, size_gb, &mut outcome).await?);
        }
        if let Some(mode) = steps.attach
            && let (Some(snapshot), Some(disk)) = (&instance, &volume)
        {
            self.attach(snapshot, disk, mode, &mut outcome).await?;
        }
        if steps.detach
            && let (Some(snapshot), Some(disk)) = (&instance, &volume)
        {
            self.detach(snapshot, disk, &mut outcome).await?;
        }
        if steps.destroy
            && let Some(disk) = &volume
        {
            self.destroy(disk, &mut outcome).await?;
        }
        Ok(outcome)
    }

    async fn create(
        &self,
        desired: &DesiredState,
        size_gb: u32,
        outcome: &mut Outcome,
    ) -> Result<Volume, ReconcileError> {
        let spec = VolumeSpec::new(&desired.name, size_gb, &desired.zone);
        let volume = match self.gateway.create_volume(&spec).await {
            Ok(created) => {
                info!(disk = %spec.name, size_gb, zone = %spec.zone, "created disk");
                created
            }
            Err(GatewayError::AlreadyExists { .. }) => {
                // Lost the creation race: another actor made the disk first.
                // Converge as success; the outcome keeps reporting the
                // requested size, the winner's actual size is not re-read.
                debug!(disk = %spec.name, "disk already exists; treating creation as converged");
                Volume {
                    name: spec.name.clone(),
                    size_gb,
                    zone: spec.zone.clone(),
                }
            }
            Err(GatewayError::QuotaExceeded { message }) => {
                return Err(ReconcileError::QuotaExceeded { message });
            }
            Err(source) => {
                return Err(ReconcileError::CreateVolume {
                    name: spec.name,
                    source,
                });
            }
        };
        outcome.size_gb = Some(size_gb);
        outcome.changed = true;
        Ok(volume)
    }

    async fn attach(
        &self,
        instance: &Instance,
        volume: &Volume,
        mode: AttachMode,
        outcome: &mut Outcome,
    ) -> Result<(), ReconcileError> {
        self.gateway
            .attach_volume(instance, volume, mode)
            .await
            .map_err(|source| ReconcileError::AttachVolume {
                name: volume.name.clone(),
                instance: instance.name.clone(),
                source,
            })?;
        info!(disk = %volume.name, instance = %instance.name, %mode, "attached disk");
        outcome.attached_to_instance = Some(instance.name.clone());
        outcome.attached_mode = Some(mode);
        outcome.changed = true;
        Ok(())
    }

    async fn detach(
        &self,
        instance: &Instance,
        volume: &Volume,
        outcome: &mut Outcome,
    ) -> Result<(), ReconcileError> {
        self.gateway
            .detach_volume(volume, instance)
            .await
            .map_err(|source| ReconcileError::DetachVolume {
                name: volume.name.clone(),
                instance: instance.name.clone(),
                source,
            })?;
        info!(disk = %volume.name, instance = %instance.name, "detached disk");
        outcome.detached_from_instance = Some(instance.name.clone());
        outcome.changed = true;
        Ok(())
    }

    async fn destroy(&self, volume: &Volume, outcome: &mut Outcome) -> Result<(), ReconcileError> {
        self.gateway
            .destroy_volume(volume)
            .await
            .map_err(|source| match source {
                GatewayError::ResourceInUse { message } => {
                    ReconcileError::VolumeInUse { message }
                }
                other => ReconcileError::DestroyVolume {
                    name: volume.name.clone(),
                    source: other,
                },
            })?;
        info!(disk = %volume.name, zone = %volume.zone, "destroyed disk");
        outcome.changed = true;
        Ok(())
    }
}
