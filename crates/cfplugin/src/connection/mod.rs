//! Plugin-side capability surface and its RPC-backed implementation.
//!
//! [`RpcConnection`] turns every [`CliConnection`] method into exactly one
//! round trip: dial the host, write one request line, read one response
//! line, close. Nothing is kept open between calls, so a plugin that stashes
//! the connection holds no socket.

use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::ConnectionError;
use crate::metadata::PluginMetadata;
use crate::models::{
    Application, CurrentSpace, DetailedApplicationSummary, Org, OrgSummary, Space,
};
use crate::protocol::{
    FrameError, PROTOCOL_VERSION, RpcMethod, RpcRequest, RpcResponse, read_message, write_message,
};

const CONNECTION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::connection");

/// Capabilities the host offers to a running plugin.
///
/// Every method blocks until the host answers. Targeting and login
/// preconditions are enforced by the host and surface as
/// [`ConnectionError::Remote`] faults.
pub trait CliConnection {
    /// Refreshes and returns the current access token.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn access_token(&self) -> Result<String, ConnectionError>;

    /// Returns the targeted API endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn api_endpoint(&self) -> Result<String, ConnectionError>;

    /// Runs a host command and returns its captured `[stdout, stderr]`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails, including the
    /// host's `unknown_command` and `command_failed` faults.
    fn cli_command(&self, args: &[String]) -> Result<Vec<String>, ConnectionError>;

    /// Like [`cli_command`](Self::cli_command) with the host's terminal
    /// output switched off for the duration of the command.
    ///
    /// Terminal output is switched back on even when the command fails.
    ///
    /// # Errors
    ///
    /// Returns the first failure among disabling output and running the
    /// command, or the re-enable failure when both of those succeeded.
    fn cli_command_without_terminal_output(
        &self,
        args: &[String],
    ) -> Result<Vec<String>, ConnectionError>;

    /// Returns a detailed summary of `name` in the targeted space.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn get_app(&self, name: &str) -> Result<DetailedApplicationSummary, ConnectionError>;

    /// Lists applications in the targeted space.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn get_apps(&self) -> Result<Vec<Application>, ConnectionError>;

    /// Returns the targeted organization.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn get_current_org(&self) -> Result<Org, ConnectionError>;

    /// Returns the targeted space.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn get_current_space(&self) -> Result<CurrentSpace, ConnectionError>;

    /// Returns a summary of the organization called `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn get_org(&self, name: &str) -> Result<OrgSummary, ConnectionError>;

    /// Returns the space called `name` in the targeted organization.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn get_space(&self, name: &str) -> Result<Space, ConnectionError>;

    /// Lists spaces in the targeted organization.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn get_spaces(&self) -> Result<Vec<Space>, ConnectionError>;

    /// Reports whether the host holds an access token.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn is_logged_in(&self) -> Result<bool, ConnectionError>;

    /// Reports whether the host skips TLS certificate verification.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails.
    fn is_skip_ssl_validation(&self) -> Result<bool, ConnectionError>;

    /// Returns the logged-in user's name.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the call fails, including the
    /// host's `not_logged_in` fault.
    fn username(&self) -> Result<String, ConnectionError>;
}

/// [`CliConnection`] backed by the host's loopback RPC listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcConnection {
    addr: SocketAddr,
}

impl RpcConnection {
    /// Creates a connection to the host listening on `127.0.0.1:<port>`.
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
        }
    }

    /// Returns the host's RPC port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Asks the host whether its build satisfies `required`.
    pub(crate) fn is_min_cli_version(&self, required: &str) -> Result<bool, ConnectionError> {
        self.call(RpcMethod::IsMinCliVersion, required)
    }

    /// Registers `metadata` with the host.
    pub(crate) fn send_metadata(&self, metadata: &PluginMetadata) -> Result<bool, ConnectionError> {
        self.call(RpcMethod::SetPluginMetadata, metadata)
    }

    fn disable_terminal_output(&self, disable: bool) -> Result<bool, ConnectionError> {
        self.call(RpcMethod::DisableTerminalOutput, &disable)
    }

    fn call<P, R>(&self, method: RpcMethod, params: &P) -> Result<R, ConnectionError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = RpcRequest::new(method, params).map_err(|source| ConnectionError::Encode {
            method,
            source: Arc::new(source),
        })?;

        let mut stream =
            TcpStream::connect(self.addr).map_err(|source| ConnectionError::Connect {
                addr: self.addr,
                source: Arc::new(source),
            })?;
        debug!(target: CONNECTION_TARGET, method = method.as_str(), port = self.port(), "calling CLI");

        let exchanged = exchange(&mut stream, method, &request);
        drop(stream);
        let line = exchanged?;

        decode_response(method, &line)
    }
}

fn exchange(
    stream: &mut TcpStream,
    method: RpcMethod,
    request: &RpcRequest,
) -> Result<Vec<u8>, ConnectionError> {
    write_message(stream, request).map_err(|error| frame_error(method, error))?;
    read_message(stream)
        .map_err(|error| frame_error(method, error))?
        .ok_or(ConnectionError::EmptyResponse { method })
}

fn frame_error(method: RpcMethod, error: FrameError) -> ConnectionError {
    match error {
        FrameError::Encode(source) => ConnectionError::Encode {
            method,
            source: Arc::new(source),
        },
        FrameError::Io(source) => ConnectionError::Io {
            method,
            source: Arc::new(source),
        },
        FrameError::TooLarge { .. } => ConnectionError::Decode {
            method,
            message: error.to_string(),
        },
    }
}

fn decode_response<R: DeserializeOwned>(
    method: RpcMethod,
    line: &[u8],
) -> Result<R, ConnectionError> {
    let response: RpcResponse =
        serde_json::from_slice(line).map_err(|error| ConnectionError::Decode {
            method,
            message: error.to_string(),
        })?;

    if response.protocol() != PROTOCOL_VERSION {
        return Err(ConnectionError::ProtocolMismatch {
            expected: PROTOCOL_VERSION,
            actual: response.protocol(),
        });
    }

    let value = response.into_result()?.unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|error| ConnectionError::Decode {
        method,
        message: error.to_string(),
    })
}

impl CliConnection for RpcConnection {
    fn access_token(&self) -> Result<String, ConnectionError> {
        self.call(RpcMethod::AccessToken, &())
    }

    fn api_endpoint(&self) -> Result<String, ConnectionError> {
        self.call(RpcMethod::ApiEndpoint, &())
    }

    fn cli_command(&self, args: &[String]) -> Result<Vec<String>, ConnectionError> {
        self.call(RpcMethod::CliCommand, args)
    }

    fn cli_command_without_terminal_output(
        &self,
        args: &[String],
    ) -> Result<Vec<String>, ConnectionError> {
        self.disable_terminal_output(true)?;
        let output = self.cli_command(args);
        let restored = self.disable_terminal_output(false);
        let lines = output?;
        restored?;
        Ok(lines)
    }

    fn get_app(&self, name: &str) -> Result<DetailedApplicationSummary, ConnectionError> {
        self.call(RpcMethod::GetApp, name)
    }

    fn get_apps(&self) -> Result<Vec<Application>, ConnectionError> {
        self.call(RpcMethod::GetApps, &())
    }

    fn get_current_org(&self) -> Result<Org, ConnectionError> {
        self.call(RpcMethod::GetCurrentOrg, &())
    }

    fn get_current_space(&self) -> Result<CurrentSpace, ConnectionError> {
        self.call(RpcMethod::GetCurrentSpace, &())
    }

    fn get_org(&self, name: &str) -> Result<OrgSummary, ConnectionError> {
        self.call(RpcMethod::GetOrg, name)
    }

    fn get_space(&self, name: &str) -> Result<Space, ConnectionError> {
        self.call(RpcMethod::GetSpace, name)
    }

    fn get_spaces(&self) -> Result<Vec<Space>, ConnectionError> {
        self.call(RpcMethod::GetSpaces, &())
    }

    fn is_logged_in(&self) -> Result<bool, ConnectionError> {
        self.call(RpcMethod::IsLoggedIn, &())
    }

    fn is_skip_ssl_validation(&self) -> Result<bool, ConnectionError> {
        self.call(RpcMethod::IsSkipSslValidation, &())
    }

    fn username(&self) -> Result<String, ConnectionError> {
        self.call(RpcMethod::Username, &())
    }
}
