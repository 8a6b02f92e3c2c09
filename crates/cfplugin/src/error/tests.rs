//! Unit tests for plugin-side error types.

use std::io;

use rstest::rstest;

use super::*;

#[test]
fn remote_error_displays_host_message() {
    let error = ConnectionError::from(RpcFault::new(
        FaultKind::NotTargeted,
        "no organization targeted",
    ));
    assert_eq!(error.to_string(), "no organization targeted");
    assert_eq!(error.fault_kind(), Some(FaultKind::NotTargeted));
}

#[rstest]
#[case::empty(ConnectionError::EmptyResponse { method: RpcMethod::GetApps })]
#[case::mismatch(ConnectionError::ProtocolMismatch { expected: 1, actual: 2 })]
#[case::decode(ConnectionError::Decode {
    method: RpcMethod::GetOrg,
    message: String::from("invalid type"),
})]
fn transport_errors_have_no_fault_kind(#[case] error: ConnectionError) {
    assert_eq!(error.fault_kind(), None);
}

#[test]
fn io_error_names_method() {
    let error = ConnectionError::Io {
        method: RpcMethod::CliCommand,
        source: Arc::new(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")),
    };
    let message = error.to_string();
    assert!(message.contains("CliCommand"), "unexpected message: {message}");
    assert!(message.contains("pipe closed"), "unexpected message: {message}");
}

#[test]
fn handshake_error_reports_attempts_and_port() {
    let error = HandshakeError::new(
        40_000,
        5,
        io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
    );
    assert_eq!(error.attempts(), 5);
    assert_eq!(error.port(), 40_000);
    let message = error.to_string();
    assert!(message.contains("40000"), "unexpected message: {message}");
    assert!(message.contains("5 attempts"), "unexpected message: {message}");
}

#[test]
fn missing_port_message_matches_cli_wording() {
    assert_eq!(
        StartError::MissingPort.to_string(),
        "This cf CLI plugin is not intended to be run on its own"
    );
}
