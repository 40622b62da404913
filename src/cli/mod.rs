//! Command-line interface definitions for the `nscale-wait` binary.
//!
//! The clap structures live here so both the binary and the build script can
//! use them, the latter to render the manual page.

use clap::{Args, Parser, ValueEnum};

/// Top-level CLI for the `nscale-wait` binary.
#[derive(Debug, Parser)]
#[command(
    name = "nscale-wait",
    about = "Wait for Nscale resource mutations to become visible",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Wait for a newly created resource to finish provisioning.
    #[command(name = "create", about = "Wait until a created resource is provisioned")]
    Create(WaitCommand),
    /// Wait for an update, identified by its operation tag, to be visible.
    #[command(name = "update", about = "Wait until an update's operation tag is visible")]
    Update(UpdateCommand),
    /// Wait for a deleted resource to disappear.
    #[command(name = "delete", about = "Wait until a deleted resource is gone")]
    Delete(WaitCommand),
    /// Read a resource once.
    #[command(name = "read", about = "Read a resource once, reporting removal on not-found")]
    Read(TargetArgs),
}

/// Resource kinds accepted on the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum KindArg {
    /// Compute instance.
    Instance,
    /// Compute cluster.
    ComputeCluster,
    /// Virtual network.
    Network,
    /// Security group.
    SecurityGroup,
    /// File storage.
    FileStorage,
}

/// Identifies the resource to read.
#[derive(Debug, Args)]
pub(crate) struct TargetArgs {
    /// Kind of resource, which selects the service endpoint.
    #[arg(long, value_enum, value_name = "KIND")]
    pub(crate) kind: KindArg,
    /// Provider identifier of the resource.
    #[arg(long, value_name = "ID")]
    pub(crate) id: String,
}

/// Overrides for the configured polling cadence.
#[derive(Debug, Args)]
pub(crate) struct PollArgs {
    /// Seconds between two reads. Overrides `NSCALE_POLL_INTERVAL_SECS`.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) poll_interval_secs: Option<u64>,
    /// Upper bound on the wait in seconds. Overrides `NSCALE_WAIT_TIMEOUT_SECS`.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) timeout_secs: Option<u64>,
}

/// Arguments for the `create` and `delete` subcommands.
#[derive(Debug, Args)]
pub(crate) struct WaitCommand {
    #[command(flatten)]
    pub(crate) target: TargetArgs,
    #[command(flatten)]
    pub(crate) poll: PollArgs,
}

/// Arguments for the `update` subcommand.
#[derive(Debug, Args)]
pub(crate) struct UpdateCommand {
    #[command(flatten)]
    pub(crate) target: TargetArgs,
    /// Operation tag written into the update request.
    #[arg(long, value_name = "TAG")]
    pub(crate) operation_tag: String,
    #[command(flatten)]
    pub(crate) poll: PollArgs,
}
