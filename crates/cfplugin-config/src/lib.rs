//! Shared configuration for the plugin RPC host.
//!
//! [`HostSettings`] is layered by `ortho_config`: built-in defaults, then
//! configuration files, then `CFPLUGIN_*` environment variables, then command
//! line flags. Every field is optional in the layered representation; the
//! accessors apply the defaults from [`defaults`] so callers never have to.

pub mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_RPC_HOST, DEFAULT_RPC_PORT, DEVELOPMENT_VERSION,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Settings consumed by the host when it supervises plugin processes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CFPLUGIN")]
pub struct HostSettings {
    /// Tracing filter expression (`EnvFilter` syntax).
    pub log_filter: Option<String>,
    /// Output format for host logs.
    pub log_format: Option<LogFormat>,
    /// Interface the RPC listener binds to.
    pub rpc_host: Option<String>,
    /// Port the RPC listener binds to; `0` selects an ephemeral port.
    pub rpc_port: Option<u16>,
    /// Version string of the host CLI build, compared against plugin
    /// minimum-version requirements.
    pub cli_version: Option<String>,
}

impl HostSettings {
    /// Returns the configured log filter or the default.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Returns the configured log format or the default.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(defaults::default_log_format)
    }

    /// Returns the interface the RPC listener binds to.
    #[must_use]
    pub fn rpc_host(&self) -> &str {
        self.rpc_host.as_deref().unwrap_or(DEFAULT_RPC_HOST)
    }

    /// Returns the port the RPC listener binds to.
    #[must_use]
    pub fn rpc_port(&self) -> u16 {
        self.rpc_port.unwrap_or(DEFAULT_RPC_PORT)
    }

    /// Returns the host CLI version, falling back to the development sentinel.
    #[must_use]
    pub fn cli_version(&self) -> &str {
        self.cli_version.as_deref().unwrap_or(DEVELOPMENT_VERSION)
    }

    /// Returns a copy of the settings with the given CLI version.
    #[must_use]
    pub fn with_cli_version(mut self, version: impl Into<String>) -> Self {
        self.cli_version = Some(version.into());
        self
    }

    /// Returns a copy of the settings bound to the given port.
    #[must_use]
    pub const fn with_rpc_port(mut self, port: u16) -> Self {
        self.rpc_port = Some(port);
        self
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let settings = HostSettings::default();
        assert_eq!(settings.log_filter(), "info");
        assert_eq!(settings.log_format(), LogFormat::Json);
        assert_eq!(settings.rpc_host(), "127.0.0.1");
        assert_eq!(settings.rpc_port(), 0);
        assert_eq!(settings.cli_version(), DEVELOPMENT_VERSION);
    }

    #[rstest]
    #[case::version(HostSettings::default().with_cli_version("8.7.1"), "8.7.1")]
    #[case::explicit(
        HostSettings { cli_version: Some(String::from("7.0.0")), ..HostSettings::default() },
        "7.0.0"
    )]
    fn cli_version_overrides(#[case] settings: HostSettings, #[case] expected: &str) {
        assert_eq!(settings.cli_version(), expected);
    }

    #[test]
    fn configured_strings_are_borrowed_back() {
        let settings = HostSettings {
            log_filter: Some(String::from("cfplugin_host=debug")),
            rpc_host: Some(String::from("::1")),
            ..HostSettings::default()
        };
        assert_eq!(settings.log_filter(), "cfplugin_host=debug");
        assert_eq!(settings.rpc_host(), "::1");
    }

    #[test]
    fn port_override_is_reported() {
        let settings = HostSettings::default().with_rpc_port(48_123);
        assert_eq!(settings.rpc_port(), 48_123);
    }
}
