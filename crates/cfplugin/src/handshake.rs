//! Liveness ping run once when a plugin process starts.
//!
//! The host launches the plugin only after its RPC listener is serving, but
//! the plugin still dials back before doing anything else: the successful
//! dial tells the host the plugin is alive and tells the plugin the port is
//! right. No request is sent on the ping connection.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::HandshakeError;

const HANDSHAKE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handshake");

/// Number of dial attempts made before giving up.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Pause after each failed dial.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

/// Retry budget for the liveness ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakePolicy {
    attempts: u32,
    interval: Duration,
}

impl HandshakePolicy {
    /// Creates a policy; at least one attempt is always made.
    #[must_use]
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        let attempts = if attempts == 0 { 1 } else { attempts };
        Self { attempts, interval }
    }

    /// Returns the number of dial attempts.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the pause after each failed attempt.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for HandshakePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_INTERVAL)
    }
}

/// Dials the host on `127.0.0.1:<port>` until it answers or the policy's
/// attempts run out, closing the connection as soon as it opens.
///
/// # Errors
///
/// Returns [`HandshakeError`] carrying the last dial error once every attempt
/// has failed. The call blocks for at most `attempts × interval` plus the
/// dial time.
pub fn ping(port: u16, policy: &HandshakePolicy) -> Result<(), HandshakeError> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let mut last_error = None::<io::Error>;

    for attempt in 1..=policy.attempts() {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                drop(stream);
                debug!(target: HANDSHAKE_TARGET, port, attempt, "CLI acknowledged plugin");
                return Ok(());
            }
            Err(error) => {
                debug!(
                    target: HANDSHAKE_TARGET,
                    port,
                    attempt,
                    %error,
                    "CLI not reachable yet"
                );
                last_error = Some(error);
                thread::sleep(policy.interval());
            }
        }
    }

    let source = last_error.unwrap_or_else(|| io::Error::other("no dial attempts were made"));
    Err(HandshakeError::new(port, policy.attempts(), source))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Instant;

    use rstest::rstest;

    use super::*;

    fn unused_port() -> u16 {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind probe listener");
        listener.local_addr().expect("probe address").port()
    }

    #[test]
    fn default_policy_is_five_attempts_200ms_apart() {
        let policy = HandshakePolicy::default();
        assert_eq!(policy.attempts(), 5);
        assert_eq!(policy.interval(), Duration::from_millis(200));
    }

    #[test]
    fn zero_attempts_are_raised_to_one() {
        assert_eq!(HandshakePolicy::new(0, Duration::ZERO).attempts(), 1);
    }

    #[test]
    fn ping_succeeds_against_listener() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind listener");
        let port = listener.local_addr().expect("address").port();
        ping(port, &HandshakePolicy::default()).expect("ping should succeed");
        let (_stream, _) = listener.accept().expect("ping connection was queued");
    }

    #[rstest]
    fn ping_gives_up_after_budget() {
        let port = unused_port();
        let started = Instant::now();
        let error = ping(port, &HandshakePolicy::default()).expect_err("nothing is listening");
        let elapsed = started.elapsed();

        assert_eq!(error.attempts(), 5);
        assert_eq!(error.port(), port);
        assert!(
            elapsed >= Duration::from_millis(1000),
            "gave up too early: {elapsed:?}"
        );
        assert!(
            elapsed < Duration::from_secs(3),
            "took too long to give up: {elapsed:?}"
        );
    }
}
