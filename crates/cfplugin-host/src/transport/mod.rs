//! Loopback listener serving the RPC service to plugin processes.
//!
//! The listener accepts connections on a background thread and hands each
//! one to a [`ConnectionHandler`] on its own thread. A connection carries at
//! most one call.

mod errors;
mod handler;
mod listener;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, RpcConnectionHandler};
pub use self::listener::{ListenerHandle, RpcListener};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
