//! Default values applied by the [`HostSettings`](crate::HostSettings) accessors.

use crate::logging::LogFormat;

/// Loopback interface the host binds its plugin RPC listener to.
pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";

/// Port used when none is configured; zero asks the OS for an ephemeral port.
pub const DEFAULT_RPC_PORT: u16 = 0;

/// Default log filter expression used by the host.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Version string reported by builds that were not stamped with a release
/// version. The version gate treats it as satisfying every requirement.
pub const DEVELOPMENT_VERSION: &str = "0.0.0-unknown-version";

/// Default logging format for the host.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
