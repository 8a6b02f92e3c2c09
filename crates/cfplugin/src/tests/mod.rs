//! Crate-level test support and BDD tests.
//!
//! [`StubHost`] plays the CLI's side of the wire so the proxy and the entry
//! sequence can be exercised over real loopback sockets.

use std::io::{BufRead, BufReader, Write};
use std::net::{Ipv4Addr, TcpListener};
use std::thread::{self, JoinHandle};

use serde_json::{Value, json};

use crate::protocol::{FaultKind, PROTOCOL_VERSION, RpcFault};


/// What a [`StubHost`] observed.
pub(crate) struct Transcript {
    /// Connections that closed without sending a request line.
    pub(crate) pings: usize,
    /// Request envelopes in arrival order.
    pub(crate) requests: Vec<Value>,
}

impl Transcript {
    /// Returns the method names of every request.
    pub(crate) fn methods(&self) -> Vec<&str> {
        self.requests
            .iter()
            .filter_map(|request| request.get("method").and_then(Value::as_str))
            .collect()
    }
}

/// Loopback listener that answers each request with the next canned reply.
///
/// A `None` reply closes the connection without answering. Pings do not
/// consume a reply. The stub stops accepting once every reply is used.
pub(crate) struct StubHost {
    port: u16,
    worker: JoinHandle<Transcript>,
}

impl StubHost {
    pub(crate) fn serve(replies: Vec<Option<Value>>) -> Self {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind stub host");
        let port = listener.local_addr().expect("stub address").port();
        let worker = thread::spawn(move || {
            let mut transcript = Transcript {
                pings: 0,
                requests: Vec::new(),
            };
            let mut replies = replies.into_iter();
            while replies.len() > 0 {
                let (stream, _) = listener.accept().expect("accept call");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
                let mut line = String::new();
                if reader.read_line(&mut line).expect("read request") == 0 {
                    transcript.pings += 1;
                    continue;
                }
                let request: Value = serde_json::from_str(&line).expect("request is JSON");
                transcript.requests.push(request);
                if let Some(Some(reply)) = replies.next() {
                    let mut writer = stream;
                    let mut encoded = serde_json::to_vec(&reply).expect("encode reply");
                    encoded.push(b'\n');
                    writer.write_all(&encoded).expect("write reply");
                }
            }
            transcript
        });
        Self { port, worker }
    }

    pub(crate) const fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn finish(self) -> Transcript {
        self.worker.join().expect("stub host panicked")
    }
}

pub(crate) fn ok(result: Value) -> Option<Value> {
    Some(json!({ "protocol": PROTOCOL_VERSION, "result": result }))
}

pub(crate) fn fault(kind: FaultKind, message: &str) -> Option<Value> {
    let fault = RpcFault::new(kind, message);
    Some(json!({ "protocol": PROTOCOL_VERSION, "error": fault }))
}

pub(crate) fn unused_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind probe");
    listener.local_addr().expect("probe address").port()
}
