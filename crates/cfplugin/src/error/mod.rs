//! Errors raised on the plugin side of the RPC channel.
//!
//! I/O and codec errors are wrapped in `Arc` so every error stays `Clone`;
//! plugins frequently stash or fan out call results.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::protocol::{FaultKind, RpcFault, RpcMethod};

/// Failure of a single call through [`RpcConnection`](crate::RpcConnection).
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    /// The host's RPC listener could not be reached.
    #[error("failed to connect to the CLI at {addr}: {source}")]
    Connect {
        /// Address that was dialled.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Sending the request or reading the response failed.
    #[error("I/O error during {method} call: {source}")]
    Io {
        /// Method being called.
        method: RpcMethod,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The request parameters could not be encoded.
    #[error("failed to encode {method} request: {source}")]
    Encode {
        /// Method being called.
        method: RpcMethod,
        /// Underlying serializer error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// The response could not be decoded into the expected type.
    #[error("failed to decode {method} response: {message}")]
    Decode {
        /// Method being called.
        method: RpcMethod,
        /// Description of the decode failure.
        message: String,
    },

    /// The host closed the connection without answering.
    #[error("the CLI closed the connection without answering {method}")]
    EmptyResponse {
        /// Method being called.
        method: RpcMethod,
    },

    /// The host speaks a different protocol version.
    #[error("protocol mismatch: plugin speaks version {expected}, CLI answered with {actual}")]
    ProtocolMismatch {
        /// Version this plugin speaks.
        expected: u32,
        /// Version the host answered with.
        actual: u32,
    },

    /// The host processed the call and reported a failure.
    #[error(transparent)]
    Remote(#[from] RpcFault),
}

impl ConnectionError {
    /// Returns the host's fault classification when the host reported one.
    #[must_use]
    pub const fn fault_kind(&self) -> Option<FaultKind> {
        match self {
            Self::Remote(fault) => Some(fault.kind()),
            _ => None,
        }
    }
}

/// The liveness ping never reached the host.
#[derive(Debug, Clone, Error)]
#[error("could not reach the CLI on port {port} after {attempts} attempts: {source}")]
pub struct HandshakeError {
    port: u16,
    attempts: u32,
    #[source]
    source: Arc<io::Error>,
}

impl HandshakeError {
    pub(crate) fn new(port: u16, attempts: u32, source: io::Error) -> Self {
        Self {
            port,
            attempts,
            source: Arc::new(source),
        }
    }

    /// Returns the port that was dialled.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns how many dial attempts were made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Failures of the plugin-process entry sequence.
#[derive(Debug, Clone, Error)]
pub enum StartError {
    /// The plugin was started without the host's port.
    #[error("This cf CLI plugin is not intended to be run on its own")]
    MissingPort,

    /// The port argument is not a valid TCP port.
    #[error("invalid CLI port argument '{value}'")]
    InvalidPort {
        /// Argument that failed to parse.
        value: String,
    },

    /// The liveness ping failed.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// A supervisor call to the host failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The host refused the pushed metadata.
    #[error("the CLI did not accept the plugin metadata")]
    MetadataRejected,
}

#[cfg(test)]
mod tests;
