//! Connection handling for the RPC listener.

use std::net::TcpStream;
use std::sync::Arc;

use cfplugin::protocol::{RpcRequest, RpcResponse, read_message, write_message};
use tracing::{debug, warn};

use super::LISTENER_TARGET;
use crate::service::{RpcService, ServiceError};

/// Handles accepted connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: TcpStream);
}

/// Reads one request, dispatches it to the service and writes the answer.
///
/// A connection that closes before sending a request line is a plugin's
/// liveness ping and gets no answer.
pub(crate) struct RpcConnectionHandler {
    service: Arc<RpcService>,
}

impl RpcConnectionHandler {
    pub(crate) const fn new(service: Arc<RpcService>) -> Self {
        Self { service }
    }

    fn respond(&self, line: &[u8]) -> RpcResponse {
        match serde_json::from_slice::<RpcRequest>(line) {
            Ok(request) => self.service.dispatch(&request),
            Err(error) => {
                let failure = ServiceError::MalformedRequest {
                    message: error.to_string(),
                };
                warn!(target: LISTENER_TARGET, error = %failure, "malformed plugin request");
                RpcResponse::failure(failure.to_fault())
            }
        }
    }
}

impl ConnectionHandler for RpcConnectionHandler {
    fn handle(&self, mut stream: TcpStream) {
        let response = match read_message(&mut stream) {
            Ok(Some(line)) => self.respond(&line),
            Ok(None) => {
                debug!(target: LISTENER_TARGET, "plugin liveness ping received");
                return;
            }
            Err(error) => {
                warn!(target: LISTENER_TARGET, %error, "failed to read plugin request");
                let failure = ServiceError::MalformedRequest {
                    message: error.to_string(),
                };
                RpcResponse::failure(failure.to_fault())
            }
        };

        if let Err(error) = write_message(&mut stream, &response) {
            warn!(target: LISTENER_TARGET, %error, "failed to write plugin response");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    use cfplugin::FaultKind;
    use serde_json::Value;

    use super::*;
    use crate::fakes::{self, FakeActor, FakeConfig, ScriptedParser};

    fn exchange(payload: &[u8]) -> Option<Value> {
        let (collaborators, _) = fakes::collaborators(
            FakeConfig::targeted(),
            FakeActor::sample(),
            ScriptedParser::default(),
        );
        let handler = RpcConnectionHandler::new(Arc::new(RpcService::new(collaborators, "7.2.0")));
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        let addr = listener.local_addr().expect("listener address");
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept connection");
            handler.handle(stream);
        });

        let mut client = TcpStream::connect(addr).expect("connect client");
        client.write_all(payload).expect("write request");
        client
            .shutdown(std::net::Shutdown::Write)
            .expect("close write half");
        let mut line = String::new();
        BufReader::new(&mut client)
            .read_line(&mut line)
            .expect("read response");
        server.join().expect("join server");

        (!line.is_empty()).then(|| serde_json::from_str(&line).expect("response is JSON"))
    }

    #[test]
    fn request_is_dispatched_and_answered() {
        let response = exchange(b"{\"protocol\":1,\"method\":\"GetCurrentOrg\",\"params\":null}\n")
            .expect("handler answers");
        assert_eq!(
            response.pointer("/result/name").and_then(Value::as_str),
            Some("my-org")
        );
    }

    #[test]
    fn empty_connection_is_a_ping() {
        assert_eq!(exchange(b""), None);
    }

    #[test]
    fn malformed_request_gets_invalid_params_fault() {
        let response = exchange(b"not json\n").expect("handler answers");
        let kind: FaultKind = serde_json::from_value(
            response.pointer("/error/kind").cloned().unwrap_or_default(),
        )
        .expect("fault kind");
        assert_eq!(kind, FaultKind::InvalidParams);
    }
}
