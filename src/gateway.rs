//! Provider gateway abstraction for disk and instance operations.
//!
//! The reconciler only ever talks to a [`ProviderGateway`]; the concrete
//! Compute Engine binding lives in [`crate::gce`] and test suites substitute
//! a scripted implementation.

use std::fmt::{self, Display};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mode a disk is (or should be) attached with.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachMode {
    /// The instance may only read from the disk.
    ReadOnly,
    /// The instance may read from and write to the disk.
    ReadWrite,
}

impl AttachMode {
    /// Returns the provider wire representation of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "READ_ONLY",
            Self::ReadWrite => "READ_WRITE",
        }
    }
}

impl Display for AttachMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A persistent disk as observed from the provider.
///
/// Identity is the `name`; the snapshot is never mutated locally, only
/// replaced by re-reading after a provider call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Volume {
    /// Disk name, unique within the zone.
    pub name: String,
    /// Current size in gigabytes.
    pub size_gb: u32,
    /// Zone the disk lives in.
    pub zone: String,
}

/// A disk attachment observed on an instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttachedDisk {
    /// Device name the disk is exposed under.
    pub device_name: String,
    /// Mode the disk is attached with.
    pub mode: AttachMode,
}

/// A read-only snapshot of a compute instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instance {
    /// Instance name, unique within the zone.
    pub name: String,
    /// Zone the instance lives in.
    pub zone: String,
    /// Disks currently attached to the instance.
    pub attached_disks: Vec<AttachedDisk>,
}

impl Instance {
    /// Returns the attachment mode of the disk exposed under `device_name`,
    /// or `None` when no such disk is attached.
    #[must_use]
    pub fn attachment(&self, device_name: &str) -> Option<AttachMode> {
        self.attached_disks
            .iter()
            .find(|disk| disk.device_name == device_name)
            .map(|disk| disk.mode)
    }
}

/// Parameters required to create a disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeSpec {
    /// Disk name to create.
    pub name: String,
    /// Requested size in gigabytes.
    pub size_gb: u32,
    /// Target zone.
    pub zone: String,
}

impl VolumeSpec {
    /// Creates a new disk specification, trimming string fields.
    #[must_use]
    pub fn new(name: impl Into<String>, size_gb: u32, zone: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_owned(),
            size_gb,
            zone: zone.into().trim().to_owned(),
        }
    }
}

/// Resource kinds reported in not-found errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResourceKind {
    /// A persistent disk.
    Disk,
    /// A compute instance.
    Instance,
}

impl Display for ResourceKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Disk => "disk",
            Self::Instance => "instance",
        })
    }
}

/// Errors raised by provider gateways.
///
/// The set is closed so each call site can match exhaustively on the
/// categories that matter to it: absence drives branch selection, an
/// existing disk on create is tolerated, quota and in-use failures carry
/// distinct messages, and everything else is a generic provider failure.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum GatewayError {
    /// The named resource does not exist in the zone.
    #[error("{kind} {name} not found in zone {zone}")]
    NotFound {
        /// Kind of resource that was looked up.
        kind: ResourceKind,
        /// Name used for the lookup.
        name: String,
        /// Zone used for the lookup.
        zone: String,
    },
    /// A disk with the requested name already exists.
    #[error("disk {name} already exists")]
    AlreadyExists {
        /// Name of the conflicting disk.
        name: String,
    },
    /// The request exceeds a provider quota.
    #[error("quota exceeded: {message}")]
    QuotaExceeded {
        /// Message returned by the provider.
        message: String,
    },
    /// The resource is in use by another resource.
    #[error("{message}")]
    ResourceInUse {
        /// Message returned by the provider, passed through verbatim.
        message: String,
    },
    /// Any other provider or transport failure.
    #[error("provider error (HTTP {status}, {code}): {message}")]
    Provider {
        /// HTTP-style status code, zero when the request never completed.
        status: u16,
        /// Provider error code or reason.
        code: String,
        /// Description of the failure.
        message: String,
    },
}

impl GatewayError {
    /// Wraps a transport-level failure that produced no provider response.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Provider {
            status: 0,
            code: String::from("transport"),
            message: message.into(),
        }
    }
}

/// Future returned by gateway operations.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Operations the reconciler requires from a provider.
///
/// Calls are issued strictly sequentially; implementations do not need to
/// support concurrent use within a run.
pub trait ProviderGateway {
    /// Looks up a disk by name within a zone.
    fn find_volume<'a>(&'a self, name: &'a str, zone: &'a str) -> GatewayFuture<'a, Volume>;

    /// Looks up an instance by name within a zone.
    fn find_instance<'a>(&'a self, name: &'a str, zone: &'a str) -> GatewayFuture<'a, Instance>;

    /// Creates a disk and returns its resulting snapshot.
    fn create_volume<'a>(&'a self, spec: &'a VolumeSpec) -> GatewayFuture<'a, Volume>;

    /// Attaches a disk to an instance under the disk's own name.
    fn attach_volume<'a>(
        &'a self,
        instance: &'a Instance,
        volume: &'a Volume,
        mode: AttachMode,
    ) -> GatewayFuture<'a, ()>;

    /// Detaches a disk from an instance.
    fn detach_volume<'a>(
        &'a self,
        volume: &'a Volume,
        instance: &'a Instance,
    ) -> GatewayFuture<'a, ()>;

    /// Destroys a disk.
    fn destroy_volume<'a>(&'a self, volume: &'a Volume) -> GatewayFuture<'a, ()>;
}
