//! Core library for the pdctl persistent-disk reconciler.
//!
//! The crate exposes a provider gateway abstraction for disk and instance
//! operations, a Compute Engine binding, and the reconciler that converges
//! one disk toward its declared lifecycle state (observe → plan → execute).

pub mod config;
pub mod gateway;
pub mod gce;
pub mod reconcile;
pub mod report;

pub use config::{ConfigError, GceConfig};
pub use gateway::{
    AttachMode, AttachedDisk, GatewayError, GatewayFuture, Instance, ProviderGateway,
    ResourceKind, Volume, VolumeSpec,
};
pub use gce::GceGateway;
pub use reconcile::{
    AttachmentFact, DesiredState, Lifecycle, Observation, Outcome, ReconcileError, Reconciler,
};
pub use report::FailureRecord;
