//! The capability every plugin executable implements.

use crate::connection::CliConnection;
use crate::metadata::PluginMetadata;

/// A plugin: something that can describe itself and run one of its
/// commands against a connection to the host.
///
/// Implementations hand themselves to [`start`](crate::start) from `main`.
pub trait Plugin {
    /// Runs the command named by `args[0]` with the remaining arguments.
    ///
    /// Errors are printed by the entry point and turn into exit status 1. A
    /// panic is caught at the same boundary and also exits with status 1.
    ///
    /// # Errors
    ///
    /// Returns whatever failure the command wants reported to the user.
    fn run(&self, connection: &dyn CliConnection, args: &[String]) -> anyhow::Result<()>;

    /// Describes the plugin and the commands it contributes.
    fn metadata(&self) -> PluginMetadata;
}
