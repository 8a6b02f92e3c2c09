//! Host side of the plugin RPC channel.
//!
//! The CLI serves plugins through an [`RpcService`]: a dispatcher that checks
//! targeting, queries the CLI's own collaborators, and re-encodes their
//! records into the shapes plugins decode. [`PluginLauncher`] puts the
//! service behind a loopback listener, starts a plugin executable with the
//! listener's port, and reports how the plugin exited.
//!
//! The platform client, the configuration store and the command parser are
//! not part of this crate. They are reached through the traits in
//! [`collaborators`], so the CLI plugs in its real implementations and tests
//! plug in fakes.

pub mod collaborators;
#[cfg(any(test, feature = "test-support"))]
pub mod fakes;
mod launcher;
mod metadata_slot;
mod service;
mod shape;
pub mod telemetry;
mod transport;
mod version_gate;

#[cfg(test)]
mod tests;

pub use self::collaborators::{
    CliConfig, CollaboratorError, Collaborators, CommandParser, HostOutput, PluginActor,
    TerminalOutput, UNKNOWN_COMMAND_CODE, Warnings,
};
pub use self::launcher::{LaunchError, PluginLauncher, PluginOutcome};
pub use self::service::{RpcService, ServiceError, TargetScope};
pub use self::shape::ShapeError;
pub use self::telemetry::{TelemetryError, TelemetryHandle};
pub use self::transport::{ListenerError, ListenerHandle, RpcListener};
pub use self::version_gate::{VersionGateError, VersionRole, is_min_cli_version};
