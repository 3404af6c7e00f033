//! Command-line interface definitions for the `pdctl` binary.
//!
//! This module isolates the clap parser structures so the build script can
//! reuse them when generating the manual page. It must stay free of crate
//! dependencies other than `clap` itself.

use clap::{Parser, ValueEnum};

/// Top-level CLI for the `pdctl` binary.
///
/// One invocation reconciles exactly one persistent disk: pdctl reads the
/// disk (and optionally one instance), compares it to the requested state,
/// and performs the minimal create/attach/detach/destroy sequence needed to
/// converge. The result is a single JSON record on stdout.
#[derive(Debug, Parser)]
#[command(
    name = "pdctl",
    about = "Converge a Compute Engine persistent disk to a declared state",
    version
)]
pub(crate) struct Cli {
    /// Name of the persistent disk. Doubles as the device name when the
    /// disk is attached to an instance.
    #[arg(long, value_name = "NAME")]
    pub(crate) name: String,
    /// Size of the disk in gigabytes, used only when the disk is created.
    ///
    /// Accepts loose numeric input (for example `5.0`); values below one
    /// gigabyte are rejected before any provider call is made.
    #[arg(long, value_name = "GB", default_value = "10")]
    pub(crate) size_gb: String,
    /// Zone the disk (and instance, if named) lives in.
    #[arg(long, value_name = "ZONE", default_value = "us-central1-b")]
    pub(crate) zone: String,
    /// Instance the disk should be attached to while present, or detached
    /// from while absent.
    #[arg(long, value_name = "INSTANCE")]
    pub(crate) instance_name: Option<String>,
    /// Attachment mode used when the disk is attached.
    #[arg(long, value_name = "MODE", value_enum, default_value = "read-only")]
    pub(crate) mode: ModeArg,
    /// Declared lifecycle state to converge toward.
    #[arg(long, value_name = "STATE", value_enum, default_value = "present")]
    pub(crate) state: StateArg,
    /// Detach the disk from the named instance without destroying it. Only
    /// meaningful together with an absent state.
    #[arg(long)]
    pub(crate) detach_only: bool,
}

/// Attachment mode accepted on the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum ModeArg {
    /// Attach the disk read-only.
    ReadOnly,
    /// Attach the disk read-write.
    ReadWrite,
}

/// Lifecycle state accepted on the command line.
///
/// `active` is an alias for `present`, and `deleted` an alias for `absent`,
/// mirroring the states accepted by comparable provisioning tools.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum StateArg {
    /// The disk should exist (and be attached when an instance is named).
    Present,
    /// Alias for `present`.
    Active,
    /// The disk should not exist, or should only be detached.
    Absent,
    /// Alias for `absent`.
    Deleted,
}
