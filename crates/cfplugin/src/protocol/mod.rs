//! Wire protocol shared by the host's RPC service and [`RpcConnection`].
//!
//! Every call is one TCP connection carrying exactly two JSONL lines: an
//! [`RpcRequest`] from the plugin, then an [`RpcResponse`] from the host.
//! Both envelopes carry [`PROTOCOL_VERSION`]. Within one protocol version the
//! payload shapes may gain or lose fields; anything incompatible requires a
//! version bump, which either side reports as a protocol mismatch.
//!
//! ```json
//! {"protocol":1,"method":"GetSpace","params":"dev"}
//! {"protocol":1,"result":{"guid":"s-1","name":"dev"}}
//! {"protocol":1,"error":{"kind":"not_targeted","message":"no organization targeted"}}
//! ```
//!
//! [`RpcConnection`]: crate::RpcConnection

use std::io::{self, Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Version tag carried by every request and response envelope.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum size of a single JSONL message in bytes.
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Methods exposed by the host's RPC service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum RpcMethod {
    /// Refreshes and returns the current access token.
    AccessToken,
    /// Returns the targeted API endpoint.
    ApiEndpoint,
    /// Runs a host command with captured output.
    CliCommand,
    /// Toggles the host's terminal output.
    DisableTerminalOutput,
    /// Returns a detailed summary of an application in the targeted space.
    GetApp,
    /// Lists applications in the targeted space.
    GetApps,
    /// Returns the targeted organization.
    GetCurrentOrg,
    /// Returns the targeted space.
    GetCurrentSpace,
    /// Returns an organization summary by name.
    GetOrg,
    /// Returns a space in the targeted organization by name.
    GetSpace,
    /// Lists spaces in the targeted organization.
    GetSpaces,
    /// Reports whether the host holds an access token.
    IsLoggedIn,
    /// Reports whether the host build satisfies a minimum version.
    IsMinCliVersion,
    /// Reports whether TLS verification is disabled.
    #[strum(serialize = "IsSkipSSLValidation")]
    IsSkipSslValidation,
    /// Registers the plugin's metadata with the host.
    SetPluginMetadata,
    /// Returns the logged-in user's name.
    Username,
}

impl RpcMethod {
    /// Returns the wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Request envelope sent by a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    protocol: u32,
    method: String,
    #[serde(default)]
    params: Value,
}

impl RpcRequest {
    /// Builds a request for `method` carrying `params`.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `params` cannot be represented as JSON.
    pub fn new<P: Serialize + ?Sized>(
        method: RpcMethod,
        params: &P,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            protocol: PROTOCOL_VERSION,
            method: method.as_str().to_owned(),
            params: serde_json::to_value(params)?,
        })
    }

    /// Builds a request from raw parts, bypassing method validation.
    #[must_use]
    pub fn from_parts(protocol: u32, method: impl Into<String>, params: Value) -> Self {
        Self {
            protocol,
            method: method.into(),
            params,
        }
    }

    /// Returns the protocol version the sender speaks.
    #[must_use]
    pub const fn protocol(&self) -> u32 {
        self.protocol
    }

    /// Returns the raw method name.
    #[must_use]
    pub const fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Returns the raw parameters.
    #[must_use]
    pub const fn params(&self) -> &Value {
        &self.params
    }

    /// Decodes the parameters into the method's argument type.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error when the parameters do not match `T`.
    pub fn decode_params<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.params)
    }
}

/// Response envelope sent by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    protocol: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<RpcFault>,
}

impl RpcResponse {
    /// Creates a successful response.
    #[must_use]
    pub const fn success(result: Value) -> Self {
        Self {
            protocol: PROTOCOL_VERSION,
            result: Some(result),
            error: None,
        }
    }

    /// Creates a failed response.
    #[must_use]
    pub const fn failure(fault: RpcFault) -> Self {
        Self {
            protocol: PROTOCOL_VERSION,
            result: None,
            error: Some(fault),
        }
    }

    /// Returns the protocol version the host speaks.
    #[must_use]
    pub const fn protocol(&self) -> u32 {
        self.protocol
    }

    /// Returns the fault, if the call failed.
    #[must_use]
    pub const fn fault(&self) -> Option<&RpcFault> {
        self.error.as_ref()
    }

    /// Splits the envelope into the result or the fault.
    ///
    /// A response carrying neither yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the fault when the host reported one.
    pub fn into_result(self) -> Result<Option<Value>, RpcFault> {
        match self.error {
            Some(fault) => Err(fault),
            None => Ok(self.result),
        }
    }
}

/// Classification of a failed call, stable across the process boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FaultKind {
    /// No organization or space is targeted.
    NotTargeted,
    /// The host holds no logged-in user.
    NotLoggedIn,
    /// The host does not know the requested command.
    UnknownCommand,
    /// The host command ran and failed.
    CommandFailed,
    /// A version string could not be parsed.
    VersionParse,
    /// The method name is not part of the service.
    UnknownMethod,
    /// The parameters do not match the method.
    InvalidParams,
    /// The peers speak different protocol versions.
    ProtocolMismatch,
    /// A host collaborator reported an error.
    Collaborator,
    /// The host hit an internal fault; retrying will not help.
    Internal,
}

/// A failure reported by the host for a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct RpcFault {
    kind: FaultKind,
    message: String,
}

impl RpcFault {
    /// Creates a fault.
    #[must_use]
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the fault classification.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Returns the host's message.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Errors raised while framing a JSONL message.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    /// Writing to or reading from the stream failed.
    #[error("stream I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The peer sent more than [`MAX_MESSAGE_BYTES`] without a newline.
    #[error("message exceeds {max_size} byte limit")]
    TooLarge {
        /// Limit that was exceeded.
        max_size: usize,
    },
}

/// Serializes `message` as one JSONL line and flushes the writer.
///
/// # Errors
///
/// Returns [`FrameError::Encode`] if serialization fails or
/// [`FrameError::Io`] if the write fails.
pub fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<(), FrameError> {
    let mut line = serde_json::to_vec(message).map_err(FrameError::Encode)?;
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()?;
    Ok(())
}

/// Reads one JSONL line of at most [`MAX_MESSAGE_BYTES`].
///
/// Returns `Ok(None)` when the peer closes the stream without sending
/// anything, and the partial line when it closes mid-line. Bytes after the
/// first newline are discarded: each direction carries a single message.
///
/// # Errors
///
/// Returns [`FrameError::Io`] on read failure or [`FrameError::TooLarge`]
/// when the line exceeds the limit.
pub fn read_message<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let bytes_read = read_with_retry(reader, &mut chunk)?;
        let Some(received) = chunk.get(..bytes_read) else {
            return Err(FrameError::Io(io::Error::other("reader overran its buffer")));
        };

        if received.is_empty() {
            return Ok(if buffer.is_empty() { None } else { Some(buffer) });
        }

        if let Some(newline) = received.iter().position(|byte| *byte == b'\n') {
            buffer.extend(received.iter().take(newline + 1));
            enforce_limit(buffer.len())?;
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(received);
        enforce_limit(buffer.len())?;
    }
}

fn read_with_retry<R: Read>(reader: &mut R, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(chunk) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
}

fn enforce_limit(size: usize) -> Result<(), FrameError> {
    if size > MAX_MESSAGE_BYTES {
        return Err(FrameError::TooLarge {
            max_size: MAX_MESSAGE_BYTES,
        });
    }
    Ok(())
}
