//! Interfaces the RPC service uses to reach the rest of the CLI.
//!
//! The configuration store, the platform client and the command parser live
//! outside this crate. The service only sees them through these traits.

mod output;
pub mod records;

use std::io::Write;

use thiserror::Error;

use self::records::{
    DetailedAppSummary, Organization, PlatformApplication, PlatformDomain, PlatformSpace,
    TargetedOrganization, TargetedSpace,
};

pub use self::output::TerminalOutput;

/// Exit code the command parser returns for a command it does not know.
pub const UNKNOWN_COMMAND_CODE: i32 = -666;

/// Non-fatal messages returned alongside platform data.
pub type Warnings = Vec<String>;

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The requested resource does not exist.
    #[error("{resource} '{name}' not found")]
    NotFound {
        /// Kind of resource, for example `App` or `Organization`.
        resource: String,
        /// Name that was looked up.
        name: String,
    },
    /// Any other failure, described by the collaborator.
    #[error("{message}")]
    Failed {
        /// Collaborator's description of the failure.
        message: String,
    },
}

impl CollaboratorError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            name: name.into(),
        }
    }

    /// Creates a generic failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Read access to the CLI's persisted configuration.
pub trait CliConfig: Send + Sync {
    /// Returns the targeted API endpoint URL.
    fn target(&self) -> String;

    /// Reports whether an organization is targeted.
    fn has_targeted_organization(&self) -> bool;

    /// Returns the targeted organization; fields are empty when none is.
    fn targeted_organization(&self) -> TargetedOrganization;

    /// Returns the targeted space; fields are empty when none is.
    fn targeted_space(&self) -> TargetedSpace;

    /// Returns the stored access token, empty when logged out.
    fn access_token(&self) -> String;

    /// Returns the logged-in user's name, empty when logged out.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the stored token cannot be read.
    fn current_user_name(&self) -> Result<String, CollaboratorError>;

    /// Reports whether TLS certificate verification is disabled.
    fn skip_ssl_validation(&self) -> bool;
}

/// Platform queries available to plugins.
///
/// Data calls return the record together with any warnings the platform
/// produced.
pub trait PluginActor: Send + Sync {
    /// Looks up an application in a space with its processes, routes and
    /// droplet.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the lookup fails.
    fn get_detailed_app_summary(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> Result<(DetailedAppSummary, Warnings), CollaboratorError>;

    /// Lists the applications in a space.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the listing fails.
    fn get_applications_by_space(
        &self,
        space_guid: &str,
    ) -> Result<(Vec<PlatformApplication>, Warnings), CollaboratorError>;

    /// Looks up an organization by name.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the lookup fails.
    fn get_organization_by_name(
        &self,
        org_name: &str,
    ) -> Result<(Organization, Warnings), CollaboratorError>;

    /// Lists the spaces of an organization.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the listing fails.
    fn get_organization_spaces(
        &self,
        org_guid: &str,
    ) -> Result<(Vec<PlatformSpace>, Warnings), CollaboratorError>;

    /// Lists the domains visible to an organization, optionally filtered by
    /// a label selector.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the listing fails.
    fn get_organization_domains(
        &self,
        org_guid: &str,
        label_selector: &str,
    ) -> Result<(Vec<PlatformDomain>, Warnings), CollaboratorError>;

    /// Looks up a space by name within an organization.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the lookup fails.
    fn get_space_by_name_and_organization(
        &self,
        space_name: &str,
        org_guid: &str,
    ) -> Result<(PlatformSpace, Warnings), CollaboratorError>;

    /// Exchanges the refresh token for a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the refresh fails.
    fn refresh_access_token(&self) -> Result<String, CollaboratorError>;
}

/// The CLI's own command parser.
pub trait CommandParser: Send + Sync {
    /// Parses and runs `args` as a CLI command line, writing to the given
    /// sinks, and returns the command's exit code.
    ///
    /// Returns [`UNKNOWN_COMMAND_CODE`] when `args` names no known command.
    fn parse_command_from_args(
        &self,
        args: &[String],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> i32;
}

/// The host's own terminal.
pub trait HostOutput: Send + Sync {
    /// Shows a warning to the user running the CLI.
    fn display_warning(&self, warning: &str);

    /// Suppresses (`true`) or restores (`false`) terminal output.
    fn disable_terminal_output(&self, disable: bool);
}

/// The collaborators an [`RpcService`](crate::RpcService) is built from.
pub struct Collaborators {
    /// Configuration store.
    pub config: Box<dyn CliConfig>,
    /// Platform client.
    pub actor: Box<dyn PluginActor>,
    /// Command parser used by `CliCommand`.
    pub parser: Box<dyn CommandParser>,
    /// Terminal the host writes warnings to.
    pub output: Box<dyn HostOutput>,
}
