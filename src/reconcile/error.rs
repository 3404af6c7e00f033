//! Error types for the reconciliation workflow.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors raised while converging a disk to its declared state.
///
/// Validation variants are produced before any mutating provider call;
/// the per-action variants wrap the provider failure that aborted the run.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ReconcileError {
    /// Raised when `detach_only` is requested without naming an instance.
    #[error("detach_only requires instance_name to be set")]
    DetachRequiresInstance,
    /// Raised when the requested size is not a whole number of gigabytes
    /// greater than or equal to one.
    #[error("size_gb must be a whole number of gigabytes, 1 or larger: got '{raw}'")]
    InvalidSize {
        /// Size value as supplied by the caller.
        raw: String,
    },
    /// Raised when an instance was named but does not exist in the zone.
    #[error("instance {name} not found in zone {zone}")]
    InstanceNotFound {
        /// Instance name supplied by the caller.
        name: String,
        /// Zone used for the lookup.
        zone: String,
    },
    /// Raised when disk creation exceeds the project quota.
    #[error("requested disk size exceeds quota: {message}")]
    QuotaExceeded {
        /// Message returned by the provider.
        message: String,
    },
    /// Raised when destroying a disk that is still in use. The provider's
    /// own message is passed through so the caller can see where.
    #[error("{message}")]
    VolumeInUse {
        /// Message returned by the provider.
        message: String,
    },
    /// Raised when the disk lookup fails for a reason other than absence.
    #[error("failed to read disk {name}: {source}")]
    ReadVolume {
        /// Disk name used for the lookup.
        name: String,
        /// Provider failure.
        #[source]
        source: GatewayError,
    },
    /// Raised when disk creation fails.
    #[error("failed to create disk {name}: {source}")]
    CreateVolume {
        /// Disk name requested.
        name: String,
        /// Provider failure.
        #[source]
        source: GatewayError,
    },
    /// Raised when attaching the disk fails.
    #[error("failed to attach disk {name} to instance {instance}: {source}")]
    AttachVolume {
        /// Disk name being attached.
        name: String,
        /// Instance the attach targeted.
        instance: String,
        /// Provider failure.
        #[source]
        source: GatewayError,
    },
    /// Raised when detaching the disk fails.
    #[error("failed to detach disk {name} from instance {instance}: {source}")]
    DetachVolume {
        /// Disk name being detached.
        name: String,
        /// Instance the detach targeted.
        instance: String,
        /// Provider failure.
        #[source]
        source: GatewayError,
    },
    /// Raised when destroying the disk fails for a reason other than being
    /// in use.
    #[error("failed to destroy disk {name}: {source}")]
    DestroyVolume {
        /// Disk name being destroyed.
        name: String,
        /// Provider failure.
        #[source]
        source: GatewayError,
    },
}
