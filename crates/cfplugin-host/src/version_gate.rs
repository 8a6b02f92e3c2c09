//! Minimum-version check for plugins.

use std::cmp::Ordering;

use cfplugin_config::DEVELOPMENT_VERSION;
use semver::Version;
use strum::Display;
use thiserror::Error;

/// Which side of the comparison failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum VersionRole {
    /// The host CLI's own version.
    Host,
    /// The version the plugin requires.
    Required,
}

/// A version string is not a valid semantic version.
#[derive(Debug, Error)]
#[error("invalid {role} version '{value}': {source}")]
pub struct VersionGateError {
    role: VersionRole,
    value: String,
    #[source]
    source: semver::Error,
}

impl VersionGateError {
    /// Returns which side failed to parse.
    #[must_use]
    pub const fn role(&self) -> VersionRole {
        self.role
    }

    /// Returns the offending version string.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Reports whether `host_version` is at least `required`.
///
/// Versions are compared by semantic-version precedence, so build metadata
/// never decides the outcome.
///
/// A development build, identified by [`DEVELOPMENT_VERSION`], satisfies
/// every requirement without parsing it.
///
/// # Errors
///
/// Returns a [`VersionGateError`] when either string is not a semantic
/// version.
pub fn is_min_cli_version(host_version: &str, required: &str) -> Result<bool, VersionGateError> {
    if host_version == DEVELOPMENT_VERSION {
        return Ok(true);
    }
    let actual = parse(VersionRole::Host, host_version)?;
    let minimum = parse(VersionRole::Required, required)?;
    Ok(actual.cmp_precedence(&minimum) != Ordering::Less)
}

fn parse(role: VersionRole, value: &str) -> Result<Version, VersionGateError> {
    Version::parse(value).map_err(|source| VersionGateError {
        role,
        value: value.to_owned(),
        source,
    })
}
