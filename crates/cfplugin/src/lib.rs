//! Plugin SDK for the cloud-platform CLI.
//!
//! Plugins are separate executables. The CLI (the *host*) opens a loopback
//! RPC listener, launches the plugin with the listener's port as its first
//! argument, and serves capability calls until the plugin exits. This crate
//! is everything a plugin links against:
//!
//! * the [`Plugin`] contract a plugin implements;
//! * [`PluginMetadata`] and the plugin-facing domain [`models`];
//! * the [`CliConnection`] capability surface and its RPC-backed
//!   implementation, [`RpcConnection`];
//! * the wire [`protocol`] shared with the host;
//! * the liveness [`handshake`] and the process entry point, [`start`].
//!
//! # Example
//!
//! ```rust,no_run
//! use cfplugin::{CliConnection, Command, Plugin, PluginMetadata, VersionType};
//!
//! struct Hello;
//!
//! impl Plugin for Hello {
//!     fn run(&self, connection: &dyn CliConnection, _args: &[String]) -> anyhow::Result<()> {
//!         let endpoint = connection.api_endpoint()?;
//!         println!("targeting {endpoint}");
//!         Ok(())
//!     }
//!
//!     fn metadata(&self) -> PluginMetadata {
//!         PluginMetadata {
//!             name: String::from("Hello"),
//!             version: VersionType::new(1, 0, 0),
//!             commands: vec![Command::new("hello", "Say hello")],
//!             ..PluginMetadata::default()
//!         }
//!     }
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     cfplugin::start(&Hello).into()
//! }
//! ```

pub mod connection;
pub mod entry;
pub mod error;
pub mod handshake;
pub mod metadata;
pub mod models;
mod plugin;
pub mod protocol;
mod version;

#[cfg(test)]
mod tests;

pub use self::connection::{CliConnection, RpcConnection};
pub use self::entry::{PluginExit, SEND_METADATA_ARG, start, start_with};
pub use self::error::{ConnectionError, HandshakeError, StartError};
pub use self::handshake::HandshakePolicy;
pub use self::metadata::{Command, PluginMetadata, Usage};
pub use self::plugin::Plugin;
pub use self::protocol::{FaultKind, RpcFault, RpcMethod};
pub use self::version::VersionType;
