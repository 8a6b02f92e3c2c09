//! Errors produced while serving a plugin call.

use cfplugin::{FaultKind, RpcFault, RpcMethod};
use strum::Display;
use thiserror::Error;

use crate::collaborators::CollaboratorError;
use crate::shape::ShapeError;
use crate::version_gate::VersionGateError;

/// Targeting level a call requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TargetScope {
    /// An organization must be targeted.
    Organization,
    /// A space must be targeted.
    Space,
}

/// Failure of a single service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The call needs a targeted organization or space.
    #[error("no {scope} targeted")]
    NotTargeted {
        /// What is missing.
        scope: TargetScope,
    },

    /// No user is logged in.
    #[error("not logged in")]
    NotLoggedIn,

    /// The configuration store failed.
    #[error("error processing config: {0}")]
    Config(#[source] CollaboratorError),

    /// The command parser does not know the command.
    #[error("unknown command '{command}'")]
    UnknownCommand {
        /// First argument of the command line.
        command: String,
    },

    /// The command ran and exited non-zero.
    #[error("command '{command}' failed with exit code {exit_code}")]
    CommandFailed {
        /// First argument of the command line.
        command: String,
        /// Exit code the parser returned.
        exit_code: i32,
    },

    /// A version string could not be parsed.
    #[error(transparent)]
    VersionParse(#[from] VersionGateError),

    /// A platform query failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// A host record does not fit the plugin model.
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeError),

    /// A result could not be encoded for the wire.
    #[error("failed to encode {method} result: {source}")]
    Encode {
        /// Method whose result failed to encode.
        method: RpcMethod,
        /// Serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The access token could not be refreshed.
    #[error("failed to refresh access token: {0}")]
    TokenRefresh(#[source] CollaboratorError),

    /// The method is not part of the service.
    #[error("unknown method '{method}'")]
    UnknownMethod {
        /// Method name as sent.
        method: String,
    },

    /// The request could not be decoded.
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// Decoder message.
        message: String,
    },

    /// The parameters do not match the method.
    #[error("invalid parameters for {method}: {message}")]
    InvalidParams {
        /// Method being called.
        method: RpcMethod,
        /// Decoder message.
        message: String,
    },

    /// The plugin speaks a different protocol version.
    #[error("protocol mismatch: CLI speaks version {expected}, plugin sent {actual}")]
    ProtocolMismatch {
        /// Version the host speaks.
        expected: u32,
        /// Version the plugin sent.
        actual: u32,
    },
}

impl ServiceError {
    /// Returns the wire classification of the error.
    #[must_use]
    pub const fn fault_kind(&self) -> FaultKind {
        match self {
            Self::NotTargeted { .. } => FaultKind::NotTargeted,
            Self::NotLoggedIn => FaultKind::NotLoggedIn,
            Self::Config(_) | Self::Collaborator(_) => FaultKind::Collaborator,
            Self::UnknownCommand { .. } => FaultKind::UnknownCommand,
            Self::CommandFailed { .. } => FaultKind::CommandFailed,
            Self::VersionParse(_) => FaultKind::VersionParse,
            Self::ShapeMismatch(_) | Self::Encode { .. } | Self::TokenRefresh(_) => {
                FaultKind::Internal
            }
            Self::UnknownMethod { .. } => FaultKind::UnknownMethod,
            Self::MalformedRequest { .. } | Self::InvalidParams { .. } => FaultKind::InvalidParams,
            Self::ProtocolMismatch { .. } => FaultKind::ProtocolMismatch,
        }
    }

    /// Reports whether the error is a host fault rather than a caller or
    /// environment condition.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self.fault_kind(), FaultKind::Internal)
    }

    /// Converts the error into the fault sent to the plugin.
    #[must_use]
    pub fn to_fault(&self) -> RpcFault {
        RpcFault::new(self.fault_kind(), self.to_string())
    }
}
